//! HTTP API endpoints for the classroom coordinator.
//!
//! This module provides the REST API used by the teacher and student web
//! clients alongside the WebSocket channel: login, AI help-chat, lecture
//! summaries, the teacher dashboard, and focus checks.
//!
//! # Endpoints
//!
//! - `GET /` - Health check
//! - `GET /ws` - WebSocket upgrade
//! - `POST /api/auth/login` - Create a lightweight session
//! - `GET /api/auth/session/:id` - Look up a session
//! - `POST /api/chat/help` - Ask the learning assistant a question
//! - `POST /api/summary/generate` - Generate a summary from a transcript
//! - `POST /api/summary/publish` - Broadcast the current summary to students
//! - `GET /api/summary/current` - The most recently generated summary
//! - `GET /api/summary/history` - Stored summaries, oldest first
//! - `GET /api/teacher/dashboard` - Dashboard payload for the teacher UI
//! - `POST /api/teacher/record-answer` - Record an answer reported over HTTP
//! - `GET /api/teacher/analytics` - Per-topic performance rollup
//! - `GET /api/focus/check` - Focus score for one student
//!
//! # Example
//!
//! ```no_run
//! use classroom_coordinator::{create_router, AppState, Config};
//!
//! # async fn example() {
//! let state = AppState::new(Config::default());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use classroom_assist::Assistant;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::difficulty::DifficultyEntry;
use crate::messages::Role;
use crate::session::{AnalyticsData, AnswerLogEntry, DashboardData, SummaryRecord};
use crate::websocket::ws_handler;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response body for the health check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Human-readable service name.
    pub message: String,
    /// Always `"running"` when the server answers at all.
    pub status: String,
    /// URL of the WebSocket endpoint.
    pub websocket: String,
}

/// Request body for the login endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Display name to log in with.
    pub name: Option<String>,
    /// Either `student` or `teacher`.
    pub role: Option<String>,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Opaque session identifier.
    pub session_id: String,
    /// Display name as given.
    pub name: String,
    /// Validated role.
    pub role: Role,
    /// Welcome message for the client to show.
    pub message: String,
}

/// A stored login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Opaque session identifier.
    pub id: String,
    /// Display name claimed at login.
    pub name: String,
    /// Role claimed at login.
    pub role: Role,
}

/// Request body for the chat help endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHelpRequest {
    /// The student's question.
    pub message: Option<String>,
    /// Who is asking.
    pub student_name: Option<String>,
}

/// Response body for the chat help endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHelpResponse {
    /// Always `true`; failures fall back to a canned reply.
    pub success: bool,
    /// The assistant's reply.
    pub response: String,
    /// Echo of the asking student's name.
    pub student_name: String,
    /// Whether the reply came from the generator or the canned fallback.
    pub ai_generated: bool,
    /// Generator mode label, absent on fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// When the reply was produced.
    pub timestamp: DateTime<Utc>,
}

/// Request body for the summary generation endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummaryRequest {
    /// Lecture notes or transcript to summarize.
    pub transcript: Option<String>,
    /// Teacher to credit; defaults to `"Teacher"`.
    pub teacher_name: Option<String>,
}

/// Response body for a generated summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSummaryResponse {
    /// Whether generation succeeded.
    pub success: bool,
    /// The full summary text.
    pub summary: String,
    /// Teacher credited with the summary.
    pub teacher: String,
    /// When the summary was stored.
    pub timestamp: DateTime<Utc>,
    /// Summary length in characters.
    pub length: usize,
    /// First 200 characters, for list views.
    pub preview: String,
    /// Status message for the client to show.
    pub message: String,
}

/// Request body for the summary publish endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummaryRequest {
    /// Teacher doing the publishing; defaults to `"Teacher"`.
    pub teacher_name: Option<String>,
}

/// Response body for a published summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummaryResponse {
    /// Whether the publish went out.
    pub success: bool,
    /// First 300 characters of the published summary.
    pub summary: String,
    /// Teacher who published.
    pub teacher: String,
    /// When the publish happened.
    pub timestamp: DateTime<Utc>,
    /// Status message for the client to show.
    pub message: String,
    /// Number of connected students the summary was delivered to.
    pub student_count: usize,
}

/// Response body for the current-summary endpoint.
///
/// `success: false` with `message`/`hint` when nothing has been generated
/// yet; `success: true` with the summary fields otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSummaryResponse {
    /// Whether a summary exists.
    pub success: bool,
    /// The current summary text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// When the current summary was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// How many summaries are held in history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_count: Option<usize>,
    /// Set when no summary exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when no summary exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Response body for the summary history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryHistoryResponse {
    /// Always `true`.
    pub success: bool,
    /// Stored summaries, oldest first.
    pub history: Vec<SummaryRecord>,
    /// Number of stored summaries.
    pub count: usize,
}

/// Response body for the teacher dashboard endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    /// Always `true`.
    pub success: bool,
    /// The dashboard payload.
    pub data: DashboardData,
    /// When the payload was assembled.
    pub timestamp: DateTime<Utc>,
    /// Status message for the client to show.
    pub message: String,
}

/// Request body for the record-answer endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAnswerRequest {
    /// Who answered.
    pub student_name: Option<String>,
    /// Topic the answer belongs to.
    pub topic: Option<String>,
    /// Whether the answer was correct; defaults to `false`.
    pub correct: Option<bool>,
    /// The answer text; defaults to `"No answer provided"`.
    pub answer: Option<String>,
}

/// Response body for the record-answer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAnswerResponse {
    /// Always `true` once validation passes.
    pub success: bool,
    /// The answer as recorded.
    pub answer_recorded: AnswerLogEntry,
    /// Difficulty entry for the topic, if it has any wrong answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_stats: Option<DifficultyEntry>,
    /// Total answers recorded this session.
    pub total_answers: usize,
}

/// Response body for the analytics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    /// Always `true`.
    pub success: bool,
    /// The analytics payload.
    pub analytics: AnalyticsData,
}

/// Query parameters for the focus check endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FocusCheckParams {
    /// The student to check.
    pub student: Option<String>,
}

/// Response body for the focus check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusCheckResponse {
    /// Whether the score fell below the attention-poll threshold.
    pub trigger_poll: bool,
    /// The student's focus score after idle decay.
    pub focus_score: u32,
    /// The student's last recorded interaction.
    pub last_interaction: DateTime<Utc>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
    /// Optional suggestion for fixing the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Error response body used by the chat route, which flags `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
///
/// Holds the coordinator, the learning assistant, and the login session
/// store, all wrapped for sharing across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The classroom coordinator behind both HTTP and WebSocket.
    pub coordinator: Arc<Coordinator>,
    /// The learning assistant answering help and summary requests.
    pub assistant: Arc<Assistant>,
    /// Login sessions keyed by session id.
    pub sessions: Arc<Mutex<HashMap<String, AuthSession>>>,
}

impl AppState {
    /// Creates an `AppState` with a fresh coordinator and the scripted
    /// assistant.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            Arc::new(Coordinator::new(config)),
            Arc::new(Assistant::scripted()),
        )
    }

    /// Creates an `AppState` around an existing coordinator and assistant.
    ///
    /// Useful when the caller also drives the coordinator directly, for
    /// example to run the focus sweep.
    #[must_use]
    pub fn with_parts(coordinator: Arc<Coordinator>, assistant: Arc<Assistant>) -> Self {
        Self {
            coordinator,
            assistant,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// Missing or malformed request fields.
    BadRequest {
        error: String,
        hint: Option<String>,
    },
    /// Missing fields on the chat route, whose error body flags `success`.
    ChatRejection { error: String },
    /// Unknown resource.
    NotFound { error: String },
}

impl ApiError {
    fn bad_request(error: impl Into<String>) -> Self {
        Self::BadRequest {
            error: error.into(),
            hint: None,
        }
    }

    fn bad_request_with_hint(error: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::BadRequest {
            error: error.into(),
            hint: Some(hint.into()),
        }
    }

    fn chat_rejection(error: impl Into<String>) -> Self {
        Self::ChatRejection {
            error: error.into(),
        }
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::NotFound {
            error: error.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest { error, hint } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error, hint }),
            )
                .into_response(),
            Self::ChatRejection { error } => (
                StatusCode::BAD_REQUEST,
                Json(ChatErrorResponse {
                    success: false,
                    error,
                }),
            )
                .into_response(),
            Self::NotFound { error } => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse { error, hint: None }),
            )
                .into_response(),
        }
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// # Arguments
///
/// * `state` - The shared application state
///
/// # Returns
///
/// An axum `Router` configured with:
/// - The health check at `/` and the WebSocket upgrade at `/ws`
/// - All API routes under `/api`
/// - CORS middleware for development
/// - Tracing middleware for request logging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS for development (allow all origins)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(handle_login))
        .route("/session/:id", get(handle_session_lookup));

    let chat_routes = Router::new().route("/help", post(handle_chat_help));

    let summary_routes = Router::new()
        .route("/generate", post(handle_summary_generate))
        .route("/publish", post(handle_summary_publish))
        .route("/current", get(handle_summary_current))
        .route("/history", get(handle_summary_history));

    let teacher_routes = Router::new()
        .route("/dashboard", get(handle_dashboard))
        .route("/record-answer", post(handle_record_answer))
        .route("/analytics", get(handle_analytics));

    let focus_routes = Router::new().route("/check", get(handle_focus_check));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/chat", chat_routes)
        .nest("/summary", summary_routes)
        .nest("/teacher", teacher_routes)
        .nest("/focus", focus_routes);

    // Combine with state and middleware
    Router::new()
        .route("/", get(handle_health))
        .route("/ws", get(ws_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /`.
///
/// Health check reporting the service name and where the WebSocket lives.
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.coordinator.config();
    Json(HealthResponse {
        message: "Personalized Learning Student Support System API".to_string(),
        status: "running".to_string(),
        websocket: format!("ws://{}:{}/ws", config.host, config.port),
    })
}

/// Handler for `POST /api/auth/login`.
///
/// Validates the name and role and hands back a session id. Sessions are
/// held in memory only.
async fn handle_login(
    State(state): State<Arc<AppState>>,
    request: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let name = request.name.unwrap_or_default();
    let role = request.role.unwrap_or_default();

    if name.is_empty() || role.is_empty() {
        return Err(ApiError::bad_request("Name and role are required"));
    }

    let Ok(role) = Role::parse(&role) else {
        return Err(ApiError::bad_request(
            "Role must be 'student' or 'teacher'",
        ));
    };

    let session_id = generate_session_id();
    let session = AuthSession {
        id: session_id.clone(),
        name: name.clone(),
        role,
    };
    state
        .sessions
        .lock()
        .await
        .insert(session_id.clone(), session);

    info!(%name, %role, session_id, "Login");

    Ok(Json(LoginResponse {
        session_id,
        message: format!("Welcome {name}! You are logged in as {role}"),
        name,
        role,
    }))
}

/// Handler for `GET /api/auth/session/:id`.
async fn handle_session_lookup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AuthSession>, ApiError> {
    state
        .sessions
        .lock()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Session not found"))
}

/// Handler for `POST /api/chat/help`.
///
/// Asks the learning assistant for a reply. A help request counts as a
/// focus interaction for the asking student. Generator failures degrade
/// to a canned reply rather than an error.
async fn handle_chat_help(
    State(state): State<Arc<AppState>>,
    request: Option<Json<ChatHelpRequest>>,
) -> Result<Json<ChatHelpResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let message = request.message.unwrap_or_default();
    let student_name = request.student_name.unwrap_or_default();

    if message.is_empty() || student_name.is_empty() {
        return Err(ApiError::chat_rejection(
            "Message and student name are required",
        ));
    }

    info!(student = %student_name, "Chat help request");
    state.coordinator.record_interaction(&student_name).await;

    match state.assistant.help(&student_name, &message).await {
        Ok(response) => Ok(Json(ChatHelpResponse {
            success: true,
            response,
            student_name,
            ai_generated: true,
            mode: Some(state.assistant.mode().to_string()),
            timestamp: Utc::now(),
        })),
        Err(error) => {
            warn!(%error, "Help generation failed, using canned reply");
            Ok(Json(ChatHelpResponse {
                success: true,
                response: format!(
                    "Hi {student_name}! I'm here to help you with your learning. \
                     What would you like to know?"
                ),
                student_name,
                ai_generated: false,
                mode: None,
                timestamp: Utc::now(),
            }))
        }
    }
}

/// Handler for `POST /api/summary/generate`.
///
/// Generates a summary from the transcript and stores it as the current
/// summary without broadcasting it.
async fn handle_summary_generate(
    State(state): State<Arc<AppState>>,
    request: Option<Json<GenerateSummaryRequest>>,
) -> Result<Json<GenerateSummaryResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let transcript = request.transcript.unwrap_or_default();

    if transcript.trim().is_empty() {
        return Err(ApiError::bad_request_with_hint(
            "Transcript is required",
            "Paste your lecture notes or transcript",
        ));
    }

    let teacher = request
        .teacher_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Teacher".to_string());

    info!(%teacher, chars = transcript.len(), "Generating summary");

    let summary = state.assistant.summarize(&transcript).await;
    let record = state.coordinator.store_summary(summary, teacher).await;

    Ok(Json(GenerateSummaryResponse {
        success: true,
        length: record.summary.chars().count(),
        preview: preview(&record.summary, 200),
        summary: record.summary,
        teacher: record.teacher,
        timestamp: record.timestamp,
        message: "Summary generated successfully. Ready to publish to students.".to_string(),
    }))
}

/// Handler for `POST /api/summary/publish`.
///
/// Broadcasts the current summary to every connected student and reports
/// how many received it.
async fn handle_summary_publish(
    State(state): State<Arc<AppState>>,
    request: Option<Json<PublishSummaryRequest>>,
) -> Result<Json<PublishSummaryResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let teacher = request
        .teacher_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Teacher".to_string());

    let Some((record, delivered)) = state.coordinator.publish_current_summary().await else {
        return Err(ApiError::bad_request_with_hint(
            "No summary available to publish",
            "Generate a summary first using /generate endpoint",
        ));
    };

    info!(%teacher, students = delivered, "Summary published");

    Ok(Json(PublishSummaryResponse {
        success: true,
        summary: preview(&record.summary, 300),
        teacher,
        timestamp: Utc::now(),
        message: "Summary published successfully! Students can now view it.".to_string(),
        student_count: delivered,
    }))
}

/// Handler for `GET /api/summary/current`.
async fn handle_summary_current(
    State(state): State<Arc<AppState>>,
) -> Json<CurrentSummaryResponse> {
    let Some(record) = state.coordinator.current_summary().await else {
        return Json(CurrentSummaryResponse {
            success: false,
            summary: None,
            last_updated: None,
            history_count: None,
            message: Some("No summary available".to_string()),
            hint: Some("Generate a summary first".to_string()),
        });
    };

    let history_count = state.coordinator.summary_history().await.len();

    Json(CurrentSummaryResponse {
        success: true,
        last_updated: Some(record.timestamp),
        summary: Some(record.summary),
        history_count: Some(history_count),
        message: None,
        hint: None,
    })
}

/// Handler for `GET /api/summary/history`.
async fn handle_summary_history(
    State(state): State<Arc<AppState>>,
) -> Json<SummaryHistoryResponse> {
    let history = state.coordinator.summary_history().await;
    Json(SummaryHistoryResponse {
        success: true,
        count: history.len(),
        history,
    })
}

/// Handler for `GET /api/teacher/dashboard`.
async fn handle_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let data = state.coordinator.dashboard().await;
    Json(DashboardResponse {
        success: true,
        data,
        timestamp: Utc::now(),
        message: "Teacher dashboard data loaded successfully".to_string(),
    })
}

/// Handler for `POST /api/teacher/record-answer`.
///
/// Records an answer reported outside the live poll flow, feeding the
/// same log and difficulty map the WebSocket path feeds.
async fn handle_record_answer(
    State(state): State<Arc<AppState>>,
    request: Option<Json<RecordAnswerRequest>>,
) -> Result<Json<RecordAnswerResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let student_name = request.student_name.unwrap_or_default();
    let topic = request.topic.unwrap_or_default();

    if student_name.is_empty() || topic.is_empty() {
        return Err(ApiError::bad_request("Student name and topic are required"));
    }

    let entry = AnswerLogEntry {
        student_name,
        topic,
        correct: request.correct.unwrap_or(false),
        answer: request
            .answer
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| "No answer provided".to_string()),
        timestamp: Utc::now(),
    };

    let (difficulty_stats, total_answers) = state
        .coordinator
        .record_external_answer(entry.clone())
        .await;

    Ok(Json(RecordAnswerResponse {
        success: true,
        answer_recorded: entry,
        difficulty_stats,
        total_answers,
    }))
}

/// Handler for `GET /api/teacher/analytics`.
async fn handle_analytics(State(state): State<Arc<AppState>>) -> Json<AnalyticsResponse> {
    let analytics = state.coordinator.analytics().await;
    Json(AnalyticsResponse {
        success: true,
        analytics,
    })
}

/// Handler for `GET /api/focus/check`.
///
/// Applies idle decay to the named student's score and reports whether an
/// attention poll should be triggered.
async fn handle_focus_check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FocusCheckParams>,
) -> Result<Json<FocusCheckResponse>, ApiError> {
    let student = params.student.unwrap_or_default();
    if student.is_empty() {
        return Err(ApiError::bad_request("Student name is required"));
    }

    let check = state.coordinator.check_focus(&student).await;

    Ok(Json(FocusCheckResponse {
        trigger_poll: check.should_trigger,
        focus_score: check.score,
        last_interaction: check.last_interaction,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Truncates `text` to its first `limit` characters and appends `...`.
fn preview(text: &str, limit: usize) -> String {
    let head: String = text.chars().take(limit).collect();
    format!("{head}...")
}

/// Generates a unique session id from the current time and a counter.
fn generate_session_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{timestamp:x}-{count:x}")
}

// ============================================================================
// Tests
// ============================================================================
