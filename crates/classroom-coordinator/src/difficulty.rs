//! Per-topic difficulty aggregation for the classroom coordinator.
//!
//! Every wrong answer feeds a per-topic tally: how many wrong answers the
//! topic has collected and which students got it wrong. Entries only ever
//! grow — a topic that was hard stays visible on the dashboard even after
//! the class moves on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Number of leading characters of a poll question used as its topic key.
const TOPIC_PREFIX_CHARS: usize = 30;

/// Derives the difficulty topic for a poll question.
///
/// The topic is the question's first 30 characters, so near-identical
/// questions group under one key. Truncation counts characters, never
/// splitting a multi-byte scalar.
///
/// # Examples
///
/// ```
/// use classroom_coordinator::difficulty::topic_for_question;
///
/// assert_eq!(topic_for_question("Short question?"), "Short question?");
/// assert_eq!(
///     topic_for_question("What does the borrow checker verify at compile time?"),
///     "What does the borrow checker v"
/// );
/// ```
#[must_use]
pub fn topic_for_question(question: &str) -> String {
    question.chars().take(TOPIC_PREFIX_CHARS).collect()
}

// ============================================================================
// DifficultyEntry
// ============================================================================

/// Difficulty signal for a single topic.
///
/// `count` grows on every wrong answer, repeats included, while `students`
/// keeps set semantics — so `count` exceeding `students.len()` means some
/// students got the topic wrong more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyEntry {
    /// Total wrong answers recorded for this topic.
    pub count: u32,

    /// Students who answered wrong at least once, in first-wrong order.
    pub students: Vec<String>,
}

impl DifficultyEntry {
    /// Creates an empty entry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            students: Vec::new(),
        }
    }

    /// Records one wrong answer by `student`.
    pub fn record(&mut self, student: &str) {
        self.count += 1;
        if !self.students.iter().any(|s| s == student) {
            self.students.push(student.to_string());
        }
    }
}

impl Default for DifficultyEntry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DifficultyAggregator
// ============================================================================

/// Aggregates wrong answers into per-topic difficulty entries.
///
/// Topics are kept in first-seen order so dashboards and the wire form are
/// stable across refreshes.
#[derive(Debug, Clone, Default)]
pub struct DifficultyAggregator {
    entries: IndexMap<String, DifficultyEntry>,
}

impl DifficultyAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Records one wrong answer by `student` under `topic`.
    pub fn record_wrong(&mut self, topic: &str, student: &str) {
        self.entries
            .entry(topic.to_string())
            .or_default()
            .record(student);
    }

    /// Returns the entry for a topic, if any wrong answer was recorded.
    #[must_use]
    pub fn get(&self, topic: &str) -> Option<&DifficultyEntry> {
        self.entries.get(topic)
    }

    /// Returns the tracked topics and entries as owned pairs, in first-seen
    /// order.
    ///
    /// This is the shape the wire protocol and dashboards consume.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, DifficultyEntry)> {
        self.entries
            .iter()
            .map(|(topic, entry)| (topic.clone(), entry.clone()))
            .collect()
    }

    /// Iterates over topics and entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DifficultyEntry)> {
        self.entries
            .iter()
            .map(|(topic, entry)| (topic.as_str(), entry))
    }

    /// Returns the number of topics with at least one wrong answer.
    #[must_use]
    pub fn topics_with_difficulty(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no wrong answer has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every student who got at least one topic wrong, deduplicated,
    /// in first-wrong order across all topics.
    #[must_use]
    pub fn struggling_students(&self) -> Vec<String> {
        let mut students: Vec<String> = Vec::new();
        for entry in self.entries.values() {
            for name in &entry.students {
                if !students.iter().any(|s| s == name) {
                    students.push(name.clone());
                }
            }
        }
        students
    }
}

// ============================================================================
// Tests
// ============================================================================
