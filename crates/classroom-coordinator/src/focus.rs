//! Focus scoring for student engagement.
//!
//! Every student carries a 0-100 focus score. Interactions push it up;
//! idleness pulls it down in two tiers. The tracker never reads the clock
//! itself — callers pass `now` in — so scoring is deterministic and
//! directly testable.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use crate::config::FocusConfig;

/// Score assigned to a student on first sight.
const INITIAL_SCORE: u32 = 100;

/// Upper bound of the focus scale.
const MAX_SCORE: u32 = 100;

// ============================================================================
// StudentFocus
// ============================================================================

/// Focus state of a single student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentFocus {
    /// Current score on the 0-100 scale.
    pub score: u32,

    /// When the student last interacted.
    pub last_interaction: DateTime<Utc>,
}

// ============================================================================
// FocusCheck / FocusAlert
// ============================================================================

/// Result of evaluating one student's focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusCheck {
    /// The score after this evaluation.
    pub score: u32,

    /// Whether the score sits below the struggling threshold.
    pub should_trigger: bool,

    /// When the student last interacted.
    pub last_interaction: DateTime<Utc>,
}

/// A student whose focus dropped below the threshold during a sweep.
///
/// Sweeps report a student only on the downward crossing, not on every tick
/// the student stays below, so each decline alerts teachers once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusAlert {
    /// The student's registered name.
    pub student: String,

    /// The score after the sweep's evaluation.
    pub score: u32,
}

// ============================================================================
// FocusTracker
// ============================================================================

/// Tracks per-student focus scores with idle decay.
///
/// An evaluation deducts the soft or hard penalty depending on how long the
/// student has been idle, and deliberately does **not** refresh the
/// interaction timestamp: consecutive evaluations while a student stays
/// idle re-apply the tier penalty each time. That repeated deduction is
/// what walks a sustained-idle student's score down past the threshold.
#[derive(Debug, Clone)]
pub struct FocusTracker {
    config: FocusConfig,
    students: IndexMap<String, StudentFocus>,
}

impl FocusTracker {
    /// Creates a tracker with the given tuning.
    #[must_use]
    pub fn new(config: FocusConfig) -> Self {
        Self {
            config,
            students: IndexMap::new(),
        }
    }

    /// Credits an interaction to `name` at time `now`.
    ///
    /// A student seen for the first time starts at 100. Existing students
    /// gain the configured boost, capped at 100. The interaction timestamp
    /// is refreshed either way.
    pub fn record_interaction(&mut self, name: &str, now: DateTime<Utc>) {
        match self.students.get_mut(name) {
            Some(focus) => {
                focus.score = (focus.score + self.config.interaction_boost).min(MAX_SCORE);
                focus.last_interaction = now;
            }
            None => {
                self.students.insert(
                    name.to_string(),
                    StudentFocus {
                        score: INITIAL_SCORE,
                        last_interaction: now,
                    },
                );
            }
        }
    }

    /// Evaluates one student's focus at time `now`, applying idle decay.
    ///
    /// Idleness past the hard tier deducts the hard penalty; past the soft
    /// tier, the soft penalty; otherwise the score is untouched. Scores
    /// saturate at 0. A student never seen before is created at 100 as if
    /// they had just interacted.
    pub fn evaluate(&mut self, name: &str, now: DateTime<Utc>) -> FocusCheck {
        let soft_idle = Duration::seconds(i64::from(self.config.soft_idle_secs));
        let hard_idle = Duration::seconds(i64::from(self.config.hard_idle_secs));
        let threshold = self.config.trigger_threshold;
        let soft_penalty = self.config.soft_penalty;
        let hard_penalty = self.config.hard_penalty;

        let focus = self
            .students
            .entry(name.to_string())
            .or_insert(StudentFocus {
                score: INITIAL_SCORE,
                last_interaction: now,
            });

        let idle = now.signed_duration_since(focus.last_interaction);
        if idle > hard_idle {
            focus.score = focus.score.saturating_sub(hard_penalty);
        } else if idle > soft_idle {
            focus.score = focus.score.saturating_sub(soft_penalty);
        }

        FocusCheck {
            score: focus.score,
            should_trigger: focus.score < threshold,
            last_interaction: focus.last_interaction,
        }
    }

    /// Evaluates every known student at time `now` and returns the students
    /// whose score crossed below the threshold during this sweep.
    pub fn evaluate_all(&mut self, now: DateTime<Utc>) -> Vec<FocusAlert> {
        let threshold = self.config.trigger_threshold;
        let names: Vec<String> = self.students.keys().cloned().collect();

        let mut alerts = Vec::new();
        for name in names {
            let before = self.students.get(&name).map_or(INITIAL_SCORE, |f| f.score);
            let check = self.evaluate(&name, now);
            if before >= threshold && check.score < threshold {
                alerts.push(FocusAlert {
                    student: name,
                    score: check.score,
                });
            }
        }
        alerts
    }

    /// Returns the focus state for a student, if seen before.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StudentFocus> {
        self.students.get(name)
    }

    /// Returns every tracked student with their current score, in first-seen
    /// order.
    #[must_use]
    pub fn scores(&self) -> Vec<(String, u32)> {
        self.students
            .iter()
            .map(|(name, focus)| (name.clone(), focus.score))
            .collect()
    }

    /// Number of students seen so far.
    #[must_use]
    pub fn students_seen(&self) -> usize {
        self.students.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
