//! Classroom Coordinator
//!
//! Manages live classroom sessions: WebSocket message routing, the poll
//! lifecycle, focus tracking, difficulty aggregation, and the HTTP API.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod difficulty;
pub mod error;
pub mod focus;
pub mod messages;
pub mod poll;
pub mod registry;
pub mod session;
pub mod websocket;

pub use api::{
    create_router, AnalyticsResponse, AppState, AuthSession, ChatHelpRequest, ChatHelpResponse,
    CurrentSummaryResponse, DashboardResponse, ErrorResponse, FocusCheckResponse,
    GenerateSummaryRequest, GenerateSummaryResponse, HealthResponse, LoginRequest, LoginResponse,
    PublishSummaryRequest, PublishSummaryResponse, RecordAnswerRequest, RecordAnswerResponse,
    SummaryHistoryResponse,
};
pub use config::{Config, FocusConfig};
pub use coordinator::Coordinator;
pub use difficulty::{DifficultyAggregator, DifficultyEntry};
pub use error::{CoordinatorError, Result};
pub use focus::{FocusAlert, FocusCheck, FocusTracker, StudentFocus};
pub use messages::{InboundMessage, OutboundMessage, Role};
pub use poll::{AnswerOutcome, Poll, PollMachine, PollSnapshot};
pub use registry::{Connection, ConnectionId, ConnectionRegistry};
pub use session::{
    AnalyticsData, AnswerLogEntry, ClassroomSession, DashboardAlert, DashboardData,
    DashboardStatistics, SummaryRecord, TopicPerformance,
};
pub use websocket::ws_handler;
