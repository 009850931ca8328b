//! Error types for the classroom coordinator.
//!
//! This module defines the error hierarchy for all coordinator operations:
//! registration, message dispatch, poll lifecycle, and configuration loading.
//! Protocol errors are always recovered locally — a misbehaving frame never
//! terminates the connection that sent it, and never the process.

use std::path::PathBuf;

/// A specialized `Result` type for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Errors that can occur while coordinating a classroom session.
///
/// Registration and poll variants describe refused client actions and are
/// phrased so their `Display` output can be echoed back to the sender as a
/// rejection reason. Configuration variants are operator-facing and include
/// actionable suggestions.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// Registration carried a role string that is neither teacher nor student.
    #[error("Invalid role '{role}': expected 'teacher' or 'student'")]
    InvalidRole {
        /// The role string as received on the wire.
        role: String,
    },

    /// Registration carried an empty or whitespace-only name.
    #[error("Registration requires a non-empty name")]
    MissingName,

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// Frame could not be decoded or carried an unknown message type.
    #[error("Unrecognized message: {detail}")]
    UnrecognizedMessage {
        /// Decoder output or the offending type tag.
        detail: String,
    },

    /// A message type reserved for the other role.
    #[error("Action '{action}' is not permitted for role '{role}'")]
    Forbidden {
        /// Role of the offending connection.
        role: String,
        /// The attempted message type.
        action: String,
    },

    // ========================================================================
    // Poll Errors
    // ========================================================================
    /// Poll creation parameters failed validation.
    #[error("Invalid poll: {reason}")]
    InvalidPoll {
        /// What the validation found.
        reason: String,
    },

    /// An answer arrived while no poll was active.
    #[error("No active poll to answer")]
    NoActivePoll,

    /// An answer index outside the poll's option range.
    #[error("Answer option {index} is out of range for a poll with {options} options")]
    InvalidOption {
        /// The submitted option index.
        index: usize,
        /// Number of options on the active poll.
        options: usize,
    },

    /// A second answer from a student who already answered this poll.
    #[error("Student '{student}' has already answered this poll")]
    DuplicateAnswer {
        /// The student's registered name.
        student: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your classroom.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoordinatorError {
    /// Creates a new `InvalidRole` error.
    #[must_use]
    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole { role: role.into() }
    }

    /// Creates a new `UnrecognizedMessage` error.
    #[must_use]
    pub fn unrecognized(detail: impl Into<String>) -> Self {
        Self::UnrecognizedMessage {
            detail: detail.into(),
        }
    }

    /// Creates a new `Forbidden` error for a role attempting a reserved action.
    #[must_use]
    pub fn forbidden(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Forbidden {
            role: role.into(),
            action: action.into(),
        }
    }

    /// Creates a new `InvalidPoll` error.
    #[must_use]
    pub fn invalid_poll(reason: impl Into<String>) -> Self {
        Self::InvalidPoll {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidOption` error.
    #[must_use]
    pub const fn invalid_option(index: usize, options: usize) -> Self {
        Self::InvalidOption { index, options }
    }

    /// Creates a new `DuplicateAnswer` error.
    #[must_use]
    pub fn duplicate_answer(student: impl Into<String>) -> Self {
        Self::DuplicateAnswer {
            student: student.into(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns `true` if this error is an expected race during normal
    /// operation and should be dropped without operator attention.
    ///
    /// A late answer after a poll ends and a double-click on an answer
    /// button both land here.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NoActivePoll | Self::DuplicateAnswer { .. })
    }

    /// Returns `true` if this error refuses a client action and its message
    /// is suitable to echo back to the sender.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidRole { .. }
                | Self::MissingName
                | Self::Forbidden { .. }
                | Self::InvalidPoll { .. }
                | Self::InvalidOption { .. }
        )
    }
}
