//! Wire protocol for the classroom coordinator.
//!
//! All frames are JSON objects tagged by a `type` field with snake_case
//! names and camelCase payload fields, matching what the classroom clients
//! send and expect. Inbound frames tolerate extra fields — clients attach
//! their role to several message types — and unknown types surface as
//! recoverable errors, never as connection failures.
//!
//! # Inbound
//!
//! - `register` - claim a name and role on this connection
//! - `create_poll` - teacher starts a poll
//! - `submit_answer` - student answers the active poll
//! - `end_poll` - teacher closes the active poll
//! - `publish_summary` - teacher pushes a summary to students
//! - `heartbeat` - liveness tick, counts as an interaction
//!
//! # Outbound
//!
//! - `new_summary`, `new_poll`, `poll_ended` - fan-out to students
//! - `answer_result` - per-student correctness verdict
//! - `poll_update`, `student_struggling`, `teacher_init` - teacher views
//! - `rejected` - refusal feedback for failed commands

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyEntry;
use crate::error::{CoordinatorError, Result};
use crate::poll::PollSnapshot;
use crate::session::AnswerLogEntry;

// ============================================================================
// Role
// ============================================================================

/// Connection role in the classroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Runs the classroom: polls, summaries, dashboards.
    Teacher,
    /// Receives summaries and answers polls.
    Student,
}

impl Role {
    /// Parses a role string, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            _ => None,
        }
    }

    /// Parses a wire role string into a `Role`.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidRole` for anything that is not
    /// `teacher` or `student` (any casing).
    pub fn parse(s: &str) -> Result<Self> {
        Self::from_str_case_insensitive(s).ok_or_else(|| CoordinatorError::invalid_role(s))
    }

    /// The canonical lowercase name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }

    /// Returns `true` for the teacher role.
    #[must_use]
    pub const fn is_teacher(&self) -> bool {
        matches!(self, Self::Teacher)
    }

    /// Returns `true` for the student role.
    #[must_use]
    pub const fn is_student(&self) -> bool {
        matches!(self, Self::Student)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid role '{s}': expected 'teacher' or 'student'"
            ))
        })
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// Inbound Messages
// ============================================================================

/// Frames clients send to the coordinator.
///
/// The `role` carried by `register` stays a plain string here so an unknown
/// role is a domain-level refusal with feedback, not a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Claim a name and role for this connection.
    Register {
        /// Display name; must be non-blank.
        name: String,
        /// Requested role string, validated at registration.
        role: String,
    },
    /// Teacher starts a poll, force-ending any active one.
    #[serde(rename_all = "camelCase")]
    CreatePoll {
        /// The question to ask.
        question: String,
        /// Answer options in display order.
        options: Vec<String>,
        /// Index of the correct option.
        correct_answer: usize,
    },
    /// Student answers the active poll with an option index.
    SubmitAnswer {
        /// The chosen option index.
        answer: usize,
    },
    /// Teacher closes the active poll.
    EndPoll {},
    /// Teacher pushes a summary to all students.
    #[serde(rename_all = "camelCase")]
    PublishSummary {
        /// The summary text.
        summary: String,
        /// Publishing teacher's display name, when the client sends one.
        #[serde(default)]
        from_teacher: Option<String>,
    },
    /// Liveness tick; refreshes the sender's focus.
    Heartbeat {},
}

impl InboundMessage {
    /// Decodes a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::UnrecognizedMessage` when the frame is not
    /// valid JSON or carries an unknown `type`.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CoordinatorError::unrecognized(e.to_string()))
    }

    /// The wire name of this message's type.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::CreatePoll { .. } => "create_poll",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::EndPoll {} => "end_poll",
            Self::PublishSummary { .. } => "publish_summary",
            Self::Heartbeat {} => "heartbeat",
        }
    }
}

// ============================================================================
// Outbound Messages
// ============================================================================

/// Frames the coordinator sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A published summary, fanned out to students.
    #[serde(rename_all = "camelCase")]
    NewSummary {
        /// The summary text.
        summary: String,
        /// Display name of the publishing teacher.
        from_teacher: String,
        /// When the summary was published.
        timestamp: DateTime<Utc>,
    },
    /// A freshly created poll, fanned out to students.
    NewPoll {
        /// The poll to display.
        poll: PollSnapshot,
    },
    /// Correctness verdict for one student's answer.
    #[serde(rename_all = "camelCase")]
    AnswerResult {
        /// Whether the submitted option was correct.
        correct: bool,
        /// Index of the correct option.
        correct_answer: usize,
    },
    /// Live answer-log and difficulty refresh for teachers.
    #[serde(rename_all = "camelCase")]
    PollUpdate {
        /// Recent answers, newest first.
        student_answers: Vec<AnswerLogEntry>,
        /// Difficulty entries as `[topic, entry]` pairs, first-seen order.
        difficulty_map: Vec<(String, DifficultyEntry)>,
    },
    /// The active poll closed; students clear their poll view.
    PollEnded {},
    /// A student's focus dropped below the threshold.
    #[serde(rename_all = "camelCase")]
    StudentStruggling {
        /// The student's registered name.
        student_name: String,
        /// Active poll topic, or `inactivity` when no poll is running.
        topic: String,
    },
    /// Classroom snapshot sent to a teacher right after registration.
    #[serde(rename_all = "camelCase")]
    TeacherInit {
        /// Text of the currently published summary, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        /// The active poll, if one is running.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        active_poll: Option<PollSnapshot>,
        /// Difficulty entries as `[topic, entry]` pairs.
        difficulty_map: Vec<(String, DifficultyEntry)>,
        /// Recent answers, newest first.
        student_answers: Vec<AnswerLogEntry>,
        /// Names of currently connected students.
        connected_students: Vec<String>,
    },
    /// A command was refused; `reason` explains why.
    Rejected {
        /// Human-readable refusal reason.
        reason: String,
    },
}

impl OutboundMessage {
    /// Creates a `new_summary` frame.
    #[must_use]
    pub fn new_summary(
        summary: impl Into<String>,
        from_teacher: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::NewSummary {
            summary: summary.into(),
            from_teacher: from_teacher.into(),
            timestamp,
        }
    }

    /// Creates a `new_poll` frame.
    #[must_use]
    pub const fn new_poll(poll: PollSnapshot) -> Self {
        Self::NewPoll { poll }
    }

    /// Creates an `answer_result` frame.
    #[must_use]
    pub const fn answer_result(correct: bool, correct_answer: usize) -> Self {
        Self::AnswerResult {
            correct,
            correct_answer,
        }
    }

    /// Creates a `poll_update` frame.
    #[must_use]
    pub const fn poll_update(
        student_answers: Vec<AnswerLogEntry>,
        difficulty_map: Vec<(String, DifficultyEntry)>,
    ) -> Self {
        Self::PollUpdate {
            student_answers,
            difficulty_map,
        }
    }

    /// Creates a `student_struggling` frame.
    #[must_use]
    pub fn student_struggling(student_name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::StudentStruggling {
            student_name: student_name.into(),
            topic: topic.into(),
        }
    }

    /// Creates a `rejected` frame from a refusal reason.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// The wire name of this message's type.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::NewSummary { .. } => "new_summary",
            Self::NewPoll { .. } => "new_poll",
            Self::AnswerResult { .. } => "answer_result",
            Self::PollUpdate { .. } => "poll_update",
            Self::PollEnded {} => "poll_ended",
            Self::StudentStruggling { .. } => "student_struggling",
            Self::TeacherInit { .. } => "teacher_init",
            Self::Rejected { .. } => "rejected",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
