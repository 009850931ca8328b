//! Poll lifecycle for the classroom coordinator.
//!
//! At most one poll is active at a time. Creating a poll while another is
//! running force-ends the old one; students answer at most once, and their
//! answers are kept in arrival order for the teacher view.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, Result};

// ============================================================================
// Poll
// ============================================================================

/// A single poll and the answers it has collected.
#[derive(Debug, Clone)]
pub struct Poll {
    /// Monotonic identifier, `poll-1`, `poll-2`, ...
    pub id: String,

    /// The question as asked.
    pub question: String,

    /// Answer options in display order.
    pub options: Vec<String>,

    /// Index of the correct option.
    pub correct_answer: usize,

    /// Whether the poll is still accepting answers.
    pub active: bool,

    /// When the poll was created.
    pub created_at: DateTime<Utc>,

    /// Answers by student name, in arrival order. First answer wins.
    pub answers: IndexMap<String, usize>,
}

impl Poll {
    /// The wire-facing view of this poll.
    #[must_use]
    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            id: self.id.clone(),
            question: self.question.clone(),
            options: self.options.clone(),
            correct_answer: self.correct_answer,
            active: self.active,
        }
    }
}

/// Wire-facing view of a poll, as embedded in `new_poll` and the teacher
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    /// Poll identifier.
    pub id: String,
    /// The question as asked.
    pub question: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_answer: usize,
    /// Whether the poll is still accepting answers.
    pub active: bool,
}

/// Result of accepting one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Whether the submitted option was correct.
    pub correct: bool,
    /// Index of the correct option, echoed to the student.
    pub correct_answer: usize,
}

// ============================================================================
// PollMachine
// ============================================================================

/// State machine holding the active poll and the record of finished ones.
///
/// Finished polls keep their collected answers; a force-ended poll's record
/// is indistinguishable from a normally ended one.
#[derive(Debug, Clone, Default)]
pub struct PollMachine {
    current: Option<Poll>,
    finished: Vec<Poll>,
    next_id: u64,
}

impl PollMachine {
    /// Creates an empty machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new active poll, force-ending any currently active one.
    ///
    /// Validation happens before the force-end, so a rejected creation
    /// leaves the running poll untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidPoll` if the question is blank,
    /// fewer than two options are given, any option is blank, or the
    /// correct-answer index is out of range.
    pub fn create(
        &mut self,
        question: &str,
        options: Vec<String>,
        correct_answer: usize,
        now: DateTime<Utc>,
    ) -> Result<PollSnapshot> {
        if question.trim().is_empty() {
            return Err(CoordinatorError::invalid_poll("question must not be empty"));
        }
        if options.len() < 2 {
            return Err(CoordinatorError::invalid_poll(format!(
                "at least two options are required, got {}",
                options.len()
            )));
        }
        if options.iter().any(|option| option.trim().is_empty()) {
            return Err(CoordinatorError::invalid_poll("options must not be blank"));
        }
        if correct_answer >= options.len() {
            return Err(CoordinatorError::invalid_poll(format!(
                "correct answer index {correct_answer} is out of range for {} options",
                options.len()
            )));
        }

        self.end();

        self.next_id += 1;
        let poll = Poll {
            id: format!("poll-{}", self.next_id),
            question: question.to_string(),
            options,
            correct_answer,
            active: true,
            created_at: now,
            answers: IndexMap::new(),
        };
        let snapshot = poll.snapshot();
        self.current = Some(poll);
        Ok(snapshot)
    }

    /// Records a student's answer to the active poll.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NoActivePoll` if no poll is running,
    /// `CoordinatorError::InvalidOption` if the index is out of range, or
    /// `CoordinatorError::DuplicateAnswer` if the student already answered.
    pub fn submit(&mut self, student: &str, answer: usize) -> Result<AnswerOutcome> {
        let poll = self.current.as_mut().ok_or(CoordinatorError::NoActivePoll)?;

        if answer >= poll.options.len() {
            return Err(CoordinatorError::invalid_option(answer, poll.options.len()));
        }
        if poll.answers.contains_key(student) {
            return Err(CoordinatorError::duplicate_answer(student));
        }

        poll.answers.insert(student.to_string(), answer);
        Ok(AnswerOutcome {
            correct: answer == poll.correct_answer,
            correct_answer: poll.correct_answer,
        })
    }

    /// Ends the active poll, if any.
    ///
    /// Returns the ended poll's final snapshot, or `None` if no poll was
    /// running. Ending is idempotent; callers broadcast `poll_ended` only
    /// when this returns `Some`.
    pub fn end(&mut self) -> Option<PollSnapshot> {
        let mut poll = self.current.take()?;
        poll.active = false;
        let snapshot = poll.snapshot();
        self.finished.push(poll);
        Some(snapshot)
    }

    /// The currently active poll, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&Poll> {
        self.current.as_ref()
    }

    /// Wire-facing snapshot of the active poll, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<PollSnapshot> {
        self.current.as_ref().map(Poll::snapshot)
    }

    /// Finished polls, oldest first, with their answers retained.
    #[must_use]
    pub fn finished(&self) -> &[Poll] {
        &self.finished
    }
}

// ============================================================================
// Tests
// ============================================================================
