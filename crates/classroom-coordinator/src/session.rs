//! Classroom session state.
//!
//! One `ClassroomSession` exists per process: a single classroom whose state
//! lives exactly as long as the server does. The session owns the poll
//! machine, the focus tracker, the difficulty aggregator, the bounded
//! answer log, and the published summary, and it is the only place that
//! glues them together — a wrong answer recorded here is what feeds the
//! difficulty map, not the callers.
//!
//! The session is transport-free. It never sends anything; the coordinator
//! reads snapshots out of it and builds the wire frames itself.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::difficulty::{topic_for_question, DifficultyAggregator, DifficultyEntry};
use crate::error::{CoordinatorError, Result};
use crate::focus::{FocusAlert, FocusCheck, FocusTracker};
use crate::poll::{AnswerOutcome, PollMachine, PollSnapshot};

// ============================================================================
// Records
// ============================================================================

/// One answered question, as kept in the rolling log and shown in teacher
/// views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerLogEntry {
    /// The student's registered name.
    pub student_name: String,

    /// Topic the question belonged to.
    pub topic: String,

    /// Whether the answer was correct.
    pub correct: bool,

    /// The chosen option's text.
    pub answer: String,

    /// When the answer was recorded.
    pub timestamp: DateTime<Utc>,
}

/// A stored summary: the text plus who published it and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    /// Summary text.
    pub summary: String,

    /// Display name of the teacher who stored it.
    pub teacher: String,

    /// When it was stored.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Dashboard & Analytics Snapshots
// ============================================================================

/// Aggregate statistics block of the dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatistics {
    /// Distinct students the session has seen interact.
    pub total_students: usize,
    /// Students connected right now.
    pub active_students: usize,
    /// All answers recorded this session.
    pub total_answers: usize,
    /// Correct answers recorded this session.
    pub correct_answers: usize,
    /// Overall accuracy, formatted as `"NN%"`.
    pub accuracy_rate: String,
    /// Topics with at least one wrong answer.
    pub topics_with_difficulty: usize,
}

/// One dashboard alert derived from the difficulty map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardAlert {
    /// Alert class: `warning` or `info`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable alert text.
    pub message: String,
    /// Display priority: `high` or `medium`.
    pub priority: String,
}

/// Everything the teacher dashboard renders in one payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Difficulty entries keyed by topic, first-seen order.
    pub struggling_students: IndexMap<String, DifficultyEntry>,
    /// Recent answers, newest first.
    pub recent_answers: Vec<AnswerLogEntry>,
    /// Aggregate counters.
    pub statistics: DashboardStatistics,
    /// Alerts derived from the difficulty map.
    pub alerts: Vec<DashboardAlert>,
}

/// Per-topic accuracy rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopicPerformance {
    /// Answers recorded for the topic.
    pub total: usize,
    /// Correct answers recorded for the topic.
    pub correct: usize,
    /// Integer accuracy percentage.
    pub accuracy: usize,
}

/// Session-wide analytics payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    /// Accuracy rollup per topic, first-seen order.
    pub topic_performance: IndexMap<String, TopicPerformance>,
    /// Difficulty entries keyed by topic.
    pub difficulty_map: IndexMap<String, DifficultyEntry>,
    /// All answers recorded this session.
    pub student_activity: usize,
    /// Overall integer accuracy percentage.
    pub average_accuracy: usize,
}

/// Running per-topic answer counters. Monotonic, unlike the bounded log.
#[derive(Debug, Clone, Copy, Default)]
struct TopicTally {
    total: usize,
    correct: usize,
}

/// Integer percentage with round-half-up; `0` when the denominator is zero.
fn percentage(part: usize, whole: usize) -> usize {
    if whole == 0 {
        0
    } else {
        (part * 100 + whole / 2) / whole
    }
}

// ============================================================================
// ClassroomSession
// ============================================================================

/// All mutable classroom state behind one owner.
///
/// Statistics are kept as running counters so the bounded answer log only
/// limits how much history dashboards replay, never the totals.
#[derive(Debug)]
pub struct ClassroomSession {
    answer_log_limit: usize,
    summary_history_limit: usize,
    polls: PollMachine,
    focus: FocusTracker,
    difficulty: DifficultyAggregator,
    answers: VecDeque<AnswerLogEntry>,
    total_answers: usize,
    correct_answers: usize,
    topic_totals: IndexMap<String, TopicTally>,
    current_summary: Option<SummaryRecord>,
    summary_history: VecDeque<SummaryRecord>,
}

impl ClassroomSession {
    /// Creates a fresh session from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            answer_log_limit: config.answer_log_limit,
            summary_history_limit: config.summary_history_limit,
            polls: PollMachine::new(),
            focus: FocusTracker::new(config.focus.clone()),
            difficulty: DifficultyAggregator::new(),
            answers: VecDeque::new(),
            total_answers: 0,
            correct_answers: 0,
            topic_totals: IndexMap::new(),
            current_summary: None,
            summary_history: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Polls
    // ------------------------------------------------------------------------

    /// Starts a new poll, force-ending any active one.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::InvalidPoll` when the question, options,
    /// or correct-answer index are unusable; the running poll is untouched.
    pub fn create_poll(
        &mut self,
        question: &str,
        options: Vec<String>,
        correct_answer: usize,
        now: DateTime<Utc>,
    ) -> Result<PollSnapshot> {
        self.polls.create(question, options, correct_answer, now)
    }

    /// Records a student's answer to the active poll.
    ///
    /// On success the answer lands in the rolling log, and a wrong answer
    /// additionally feeds the difficulty map under the poll's topic.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::NoActivePoll`, `InvalidOption`, or
    /// `DuplicateAnswer`; none of them change any session state.
    pub fn submit_answer(
        &mut self,
        student: &str,
        answer: usize,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome> {
        let (topic, answer_text) = {
            let poll = self.polls.active().ok_or(CoordinatorError::NoActivePoll)?;
            let option_count = poll.options.len();
            let text = poll
                .options
                .get(answer)
                .cloned()
                .ok_or_else(|| CoordinatorError::invalid_option(answer, option_count))?;
            (topic_for_question(&poll.question), text)
        };

        let outcome = self.polls.submit(student, answer)?;

        self.push_answer(AnswerLogEntry {
            student_name: student.to_string(),
            topic: topic.clone(),
            correct: outcome.correct,
            answer: answer_text,
            timestamp: now,
        });
        if !outcome.correct {
            self.difficulty.record_wrong(&topic, student);
        }
        Ok(outcome)
    }

    /// Ends the active poll; `None` when no poll was running.
    pub fn end_poll(&mut self) -> Option<PollSnapshot> {
        self.polls.end()
    }

    /// Snapshot of the active poll, if any.
    #[must_use]
    pub fn active_poll(&self) -> Option<PollSnapshot> {
        self.polls.snapshot()
    }

    /// Topic of the active poll, if any.
    #[must_use]
    pub fn active_topic(&self) -> Option<String> {
        self.polls
            .active()
            .map(|poll| topic_for_question(&poll.question))
    }

    // ------------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------------

    /// Credits an interaction to a student's focus score.
    pub fn record_interaction(&mut self, student: &str, now: DateTime<Utc>) {
        self.focus.record_interaction(student, now);
    }

    /// Applies idle decay for one student and reports the result.
    pub fn check_focus(&mut self, student: &str, now: DateTime<Utc>) -> FocusCheck {
        self.focus.evaluate(student, now)
    }

    /// Applies idle decay to every tracked student, returning alerts for
    /// those who crossed below the trigger threshold on this sweep.
    pub fn sweep_focus(&mut self, now: DateTime<Utc>) -> Vec<FocusAlert> {
        self.focus.evaluate_all(now)
    }

    // ------------------------------------------------------------------------
    // Answers & Difficulty
    // ------------------------------------------------------------------------

    /// Records an answer reported from outside the live poll flow.
    ///
    /// Wrong answers feed the difficulty map exactly like poll answers do.
    /// Returns the topic's difficulty entry after the update and the
    /// session-wide answer total.
    pub fn record_external_answer(
        &mut self,
        entry: AnswerLogEntry,
    ) -> (Option<DifficultyEntry>, usize) {
        if !entry.correct {
            self.difficulty
                .record_wrong(&entry.topic, &entry.student_name);
        }
        let topic = entry.topic.clone();
        self.push_answer(entry);
        (self.difficulty.get(&topic).cloned(), self.total_answers)
    }

    /// Recent answers, newest first.
    #[must_use]
    pub fn recent_answers(&self) -> Vec<AnswerLogEntry> {
        self.answers.iter().rev().cloned().collect()
    }

    /// Difficulty entries as `[topic, entry]` pairs, first-seen order.
    #[must_use]
    pub fn difficulty_pairs(&self) -> Vec<(String, DifficultyEntry)> {
        self.difficulty.pairs()
    }

    fn difficulty_snapshot(&self) -> IndexMap<String, DifficultyEntry> {
        self.difficulty
            .iter()
            .map(|(topic, entry)| (topic.to_string(), entry.clone()))
            .collect()
    }

    fn push_answer(&mut self, entry: AnswerLogEntry) {
        self.total_answers += 1;
        if entry.correct {
            self.correct_answers += 1;
        }
        let tally = self.topic_totals.entry(entry.topic.clone()).or_default();
        tally.total += 1;
        if entry.correct {
            tally.correct += 1;
        }

        self.answers.push_back(entry);
        while self.answers.len() > self.answer_log_limit {
            self.answers.pop_front();
        }
    }

    // ------------------------------------------------------------------------
    // Summaries
    // ------------------------------------------------------------------------

    /// Stores a summary as the current one and appends it to the bounded
    /// history. Returns the stored record.
    pub fn store_summary(
        &mut self,
        summary: impl Into<String>,
        teacher: impl Into<String>,
        now: DateTime<Utc>,
    ) -> SummaryRecord {
        let record = SummaryRecord {
            summary: summary.into(),
            teacher: teacher.into(),
            timestamp: now,
        };
        self.current_summary = Some(record.clone());
        self.summary_history.push_back(record.clone());
        while self.summary_history.len() > self.summary_history_limit {
            self.summary_history.pop_front();
        }
        record
    }

    /// The current summary, if one has been stored.
    #[must_use]
    pub const fn current_summary(&self) -> Option<&SummaryRecord> {
        self.current_summary.as_ref()
    }

    /// Stored summaries, oldest first.
    #[must_use]
    pub fn summary_history(&self) -> Vec<SummaryRecord> {
        self.summary_history.iter().cloned().collect()
    }

    // ------------------------------------------------------------------------
    // Dashboard & Analytics
    // ------------------------------------------------------------------------

    /// Builds the teacher dashboard payload.
    ///
    /// `active_students` comes from the connection registry; everything
    /// else is session state.
    #[must_use]
    pub fn dashboard(&self, active_students: usize) -> DashboardData {
        DashboardData {
            struggling_students: self.difficulty_snapshot(),
            recent_answers: self.recent_answers(),
            statistics: DashboardStatistics {
                total_students: self.focus.students_seen(),
                active_students,
                total_answers: self.total_answers,
                correct_answers: self.correct_answers,
                accuracy_rate: format!(
                    "{}%",
                    percentage(self.correct_answers, self.total_answers)
                ),
                topics_with_difficulty: self.difficulty.topics_with_difficulty(),
            },
            alerts: self.alerts(),
        }
    }

    /// Builds the session-wide analytics payload.
    #[must_use]
    pub fn analytics(&self) -> AnalyticsData {
        let topic_performance = self
            .topic_totals
            .iter()
            .map(|(topic, tally)| {
                (
                    topic.clone(),
                    TopicPerformance {
                        total: tally.total,
                        correct: tally.correct,
                        accuracy: percentage(tally.correct, tally.total),
                    },
                )
            })
            .collect();

        AnalyticsData {
            topic_performance,
            difficulty_map: self.difficulty_snapshot(),
            student_activity: self.total_answers,
            average_accuracy: percentage(self.correct_answers, self.total_answers),
        }
    }

    /// Derives dashboard alerts from the difficulty map: a high-priority
    /// warning for the hardest topic and a review hint for the runner-up.
    fn alerts(&self) -> Vec<DashboardAlert> {
        let mut ranked: Vec<(&str, &DifficultyEntry)> = self.difficulty.iter().collect();
        ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));

        let mut alerts = Vec::new();
        if let Some((topic, entry)) = ranked.first() {
            alerts.push(DashboardAlert {
                kind: "warning".to_string(),
                message: format!(
                    "{} students struggling with {topic}",
                    entry.students.len()
                ),
                priority: "high".to_string(),
            });
        }
        if let Some((topic, _)) = ranked.get(1) {
            alerts.push(DashboardAlert {
                kind: "info".to_string(),
                message: format!("Consider reviewing {topic} concepts"),
                priority: "medium".to_string(),
            });
        }
        alerts
    }
}

// ============================================================================
// Tests
// ============================================================================
