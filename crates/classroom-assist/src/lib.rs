//! Classroom Assistant
//!
//! Text generation for lecture summaries and student help replies.
//!
//! This crate provides the [`Assistant`] facade used by the HTTP layer and
//! the [`TextGenerator`] trait its backends implement. The bundled backend
//! is [`ScriptedGenerator`], which answers from a fixed response script so
//! the system works without any hosted model.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub mod generator;

pub use generator::ScriptedGenerator;

/// Errors that can occur during text generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backing model rejected or failed the request.
    #[error("generation backend error: {0}")]
    Backend(String),

    /// The scripted generator has no response for this prompt shape.
    #[error("no scripted response: {0}")]
    Unscripted(String),
}

impl GenerationError {
    /// Creates a backend failure error.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }

    /// Creates an unscripted-prompt error.
    #[must_use]
    pub fn unscripted(reason: impl Into<String>) -> Self {
        Self::Unscripted(reason.into())
    }
}

/// A text generation backend.
///
/// Implementations answer free-form prompts. The bundled implementation is
/// [`ScriptedGenerator`]; a client for a hosted model would implement the
/// same trait.
#[async_trait]
pub trait TextGenerator: std::fmt::Debug + Send + Sync {
    /// Generates a reply for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// A short label describing the backend, reported to API clients.
    fn mode(&self) -> &'static str;
}

/// Fallback summary used when generation fails.
pub const SUMMARY_FALLBACK: &str = "• Unable to generate summary at the moment.\n\
                                    • Please review the main points yourself.\n\
                                    • Focus on key concepts mentioned.";

/// Builds the prompt for a student help request.
///
/// The scripted generator parses the student name and message back out of
/// this exact shape.
#[must_use]
pub fn help_prompt(student_name: &str, message: &str) -> String {
    format!("Student Name: {student_name}\nStudent's Message/Question: \"{message}\"")
}

/// Builds the prompt for a lecture summary request.
#[must_use]
pub fn summary_prompt(transcript: &str) -> String {
    format!(
        "You are an expert teacher's assistant. Create a clear, concise summary of the \
         following lecture transcript for students.\n\n    \
         LECTURE TRANSCRIPT:\n    \
         {transcript}\n    \n    \
         Please provide:\n    \
         1. 5-7 key bullet points of main concepts\n    \
         2. Important terms and definitions\n    \
         3. Practical examples mentioned\n    \
         4. Key takeaways for students\n    \
         5. Any assignments or follow-up work\n    \n    \
         Format the summary in a way that's easy for students to review:"
    )
}

/// High-level interface over a [`TextGenerator`].
///
/// Wraps prompt construction and fallback handling so callers deal in
/// domain terms (help requests, transcripts) rather than raw prompts.
#[derive(Debug)]
pub struct Assistant {
    generator: Box<dyn TextGenerator>,
}

impl Assistant {
    /// Creates an assistant around the given generator backend.
    #[must_use]
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Creates an assistant backed by the scripted response simulator.
    #[must_use]
    pub fn scripted() -> Self {
        Self::new(Box::new(ScriptedGenerator::new()))
    }

    /// Answers a student help request.
    ///
    /// # Errors
    ///
    /// Returns the generator's error when it cannot produce a reply; the
    /// caller decides how to degrade.
    pub async fn help(&self, student_name: &str, message: &str) -> Result<String, GenerationError> {
        self.generator
            .generate(&help_prompt(student_name, message))
            .await
    }

    /// Summarizes a lecture transcript.
    ///
    /// Generation failures degrade to a canned bullet list instead of an
    /// error, so a summary is always produced.
    pub async fn summarize(&self, transcript: &str) -> String {
        match self.generator.generate(&summary_prompt(transcript)).await {
            Ok(summary) => summary,
            Err(error) => {
                warn!(%error, "Summary generation failed, using fallback bullets");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    /// The backend's mode label.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        self.generator.mode()
    }
}
