//! Central event dispatch for the classroom.
//!
//! The [`Coordinator`] is the single owner of all mutable classroom state.
//! Every inbound frame, HTTP mutation, and focus sweep funnels through it,
//! which serializes state changes behind one session lock. Outbound frames
//! are computed under that lock, then sent after it is released — the
//! session lock and the registry lock are never held at the same time.
//!
//! Dispatch rules:
//!
//! - `create_poll`, `end_poll`, and `publish_summary` are teacher commands;
//!   `submit_answer` is a student command. A role mismatch is `Forbidden`.
//! - Teachers get explicit `rejected` frames when a command fails, so their
//!   tooling stays debuggable. Students get silence: a rejected answer
//!   simply produces no `answer_result`.
//! - Benign failures (`DuplicateAnswer`, ending or answering a missing
//!   poll) are logged at debug level and dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::difficulty::DifficultyEntry;
use crate::error::{CoordinatorError, Result};
use crate::focus::{FocusAlert, FocusCheck};
use crate::messages::{InboundMessage, OutboundMessage, Role};
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::session::{
    AnalyticsData, AnswerLogEntry, ClassroomSession, DashboardData, SummaryRecord,
};

/// Topic reported for focus alerts raised while no poll is running.
const IDLE_TOPIC: &str = "inactivity";

// ============================================================================
// Coordinator
// ============================================================================

/// Routes classroom events between connections and the session state.
#[derive(Debug)]
pub struct Coordinator {
    config: Config,
    registry: ConnectionRegistry,
    session: Mutex<ClassroomSession>,
}

impl Coordinator {
    /// Creates a coordinator with a fresh session.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let session = ClassroomSession::new(&config);
        Self {
            config,
            registry: ConnectionRegistry::new(),
            session: Mutex::new(session),
        }
    }

    /// The configuration this coordinator runs with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Inbound Dispatch
    // ------------------------------------------------------------------------

    /// Handles one raw text frame from a connection.
    ///
    /// `sender` is the connection's outbound queue; it is only consulted
    /// when the frame turns out to be a `register`, and for refusal
    /// feedback on a failed registration.
    pub async fn handle_frame(
        &self,
        id: ConnectionId,
        raw: &str,
        sender: &mpsc::UnboundedSender<OutboundMessage>,
    ) {
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(error) => {
                warn!(conn_id = %id, %error, "dropping unrecognized frame");
                return;
            }
        };

        if let InboundMessage::Register { name, role } = &message {
            if let Err(error) = self.register(id, name, role, sender.clone()).await {
                warn!(conn_id = %id, name, %error, "registration refused");
                // The connection is not in the registry yet, so the refusal
                // goes straight down its queue.
                let _ = sender.send(OutboundMessage::rejected(error.to_string()));
            }
            return;
        }

        let Some((name, role)) = self.registry.identity(id).await else {
            warn!(
                conn_id = %id,
                message_type = message.message_type(),
                "dropping frame from unregistered connection"
            );
            return;
        };

        // Any decodable frame counts as liveness, and as a focus
        // interaction for students, before its own handling runs.
        self.registry.touch(id).await;
        if role.is_student() {
            self.session
                .lock()
                .await
                .record_interaction(&name, Utc::now());
        }

        match message {
            // Registration returned early, before the identity gate.
            InboundMessage::Register { .. } => {}
            InboundMessage::CreatePoll {
                question,
                options,
                correct_answer,
            } => {
                self.create_poll(id, &name, role, &question, options, correct_answer)
                    .await;
            }
            InboundMessage::SubmitAnswer { answer } => {
                self.submit_answer(id, &name, role, answer).await;
            }
            InboundMessage::EndPoll {} => self.end_poll(id, &name, role).await,
            InboundMessage::PublishSummary {
                summary,
                from_teacher,
            } => {
                let teacher = from_teacher.unwrap_or_else(|| name.clone());
                self.publish_summary(id, role, summary, teacher).await;
            }
            InboundMessage::Heartbeat {} => {
                debug!(conn_id = %id, name, "heartbeat");
            }
        }
    }

    /// Deregisters a connection after its socket closes.
    pub async fn handle_disconnect(&self, id: ConnectionId) {
        if let Some(connection) = self.registry.unregister(id).await {
            info!(
                conn_id = %id,
                name = %connection.name,
                role = %connection.role,
                "connection closed"
            );
        } else {
            debug!(conn_id = %id, "unregistered connection closed");
        }
    }

    async fn register(
        &self,
        id: ConnectionId,
        name: &str,
        role: &str,
        sender: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Result<()> {
        let (name, role) = self.registry.register(id, name, role, sender).await?;
        info!(conn_id = %id, name, %role, "registered");

        match role {
            Role::Teacher => self.send_teacher_init(id).await,
            Role::Student => {
                self.session
                    .lock()
                    .await
                    .record_interaction(&name, Utc::now());
                self.replay_for_student(id).await;
            }
        }
        Ok(())
    }

    /// Sends a freshly registered teacher the full classroom snapshot.
    async fn send_teacher_init(&self, id: ConnectionId) {
        let (summary, active_poll, difficulty_map, student_answers) = {
            let session = self.session.lock().await;
            (
                session.current_summary().map(|s| s.summary.clone()),
                session.active_poll(),
                session.difficulty_pairs(),
                session.recent_answers(),
            )
        };
        let connected_students = self.registry.names_for_role(Role::Student).await;

        let init = OutboundMessage::TeacherInit {
            summary,
            active_poll,
            difficulty_map,
            student_answers,
            connected_students,
        };
        self.registry.send_to(id, init).await;
    }

    /// Replays the published summary and the active poll to a student who
    /// just joined, so late arrivals see the same classroom as everyone
    /// else.
    async fn replay_for_student(&self, id: ConnectionId) {
        let (summary, poll) = {
            let session = self.session.lock().await;
            (session.current_summary().cloned(), session.active_poll())
        };

        if let Some(record) = summary {
            let frame =
                OutboundMessage::new_summary(record.summary, record.teacher, record.timestamp);
            self.registry.send_to(id, frame).await;
        }
        if let Some(snapshot) = poll {
            self.registry
                .send_to(id, OutboundMessage::new_poll(snapshot))
                .await;
        }
    }

    async fn create_poll(
        &self,
        id: ConnectionId,
        name: &str,
        role: Role,
        question: &str,
        options: Vec<String>,
        correct_answer: usize,
    ) {
        if !role.is_teacher() {
            self.refuse(id, role, &CoordinatorError::forbidden(role.as_str(), "create_poll"))
                .await;
            return;
        }

        let created = {
            let mut session = self.session.lock().await;
            session.create_poll(question, options, correct_answer, Utc::now())
        };

        match created {
            Ok(snapshot) => {
                info!(poll_id = %snapshot.id, teacher = name, "poll created");
                let delivered = self
                    .registry
                    .broadcast_to_role(Role::Student, &OutboundMessage::new_poll(snapshot))
                    .await;
                debug!(delivered, "new poll fanned out");
            }
            Err(error) => self.refuse(id, role, &error).await,
        }
    }

    async fn submit_answer(&self, id: ConnectionId, name: &str, role: Role, answer: usize) {
        if !role.is_student() {
            self.refuse(id, role, &CoordinatorError::forbidden(role.as_str(), "submit_answer"))
                .await;
            return;
        }

        let submission = {
            let mut session = self.session.lock().await;
            session
                .submit_answer(name, answer, Utc::now())
                .map(|outcome| {
                    (
                        outcome,
                        session.recent_answers(),
                        session.difficulty_pairs(),
                    )
                })
        };

        match submission {
            Ok((outcome, answers, difficulty)) => {
                info!(student = name, answer, correct = outcome.correct, "answer recorded");
                self.registry
                    .send_to(
                        id,
                        OutboundMessage::answer_result(outcome.correct, outcome.correct_answer),
                    )
                    .await;
                self.registry
                    .broadcast_to_role(
                        Role::Teacher,
                        &OutboundMessage::poll_update(answers, difficulty),
                    )
                    .await;
            }
            // A rejected answer produces no frame for the student; silence
            // is the signal.
            Err(error) if error.is_benign() => {
                debug!(conn_id = %id, student = name, %error, "answer ignored");
            }
            Err(error) => {
                warn!(conn_id = %id, student = name, %error, "answer refused");
            }
        }
    }

    async fn end_poll(&self, id: ConnectionId, name: &str, role: Role) {
        if !role.is_teacher() {
            self.refuse(id, role, &CoordinatorError::forbidden(role.as_str(), "end_poll"))
                .await;
            return;
        }

        let ended = self.session.lock().await.end_poll();
        match ended {
            Some(snapshot) => {
                info!(poll_id = %snapshot.id, teacher = name, "poll ended");
                self.registry
                    .broadcast_to_role(Role::Student, &OutboundMessage::PollEnded {})
                    .await;
            }
            // Ending without an active poll is idempotent, not an error.
            None => debug!(teacher = name, "end_poll with no active poll"),
        }
    }

    async fn publish_summary(&self, id: ConnectionId, role: Role, summary: String, teacher: String) {
        if !role.is_teacher() {
            self.refuse(id, role, &CoordinatorError::forbidden(role.as_str(), "publish_summary"))
                .await;
            return;
        }

        let record = {
            let mut session = self.session.lock().await;
            session.store_summary(summary, teacher, Utc::now())
        };
        info!(teacher = %record.teacher, chars = record.summary.len(), "summary published");

        let frame = OutboundMessage::new_summary(record.summary, record.teacher, record.timestamp);
        let delivered = self
            .registry
            .broadcast_to_role(Role::Student, &frame)
            .await;
        debug!(delivered, "summary fanned out");
    }

    /// Logs a refused command; teachers additionally get a `rejected`
    /// frame.
    async fn refuse(&self, id: ConnectionId, role: Role, error: &CoordinatorError) {
        warn!(conn_id = %id, %role, %error, "command refused");
        if role.is_teacher() {
            self.registry
                .send_to(id, OutboundMessage::rejected(error.to_string()))
                .await;
        }
    }

    // ------------------------------------------------------------------------
    // Focus Sweep
    // ------------------------------------------------------------------------

    /// Spawns the periodic focus sweep.
    ///
    /// Every `focus.sweepIntervalSecs` the sweep applies idle decay to all
    /// tracked students and alerts teachers about everyone who crossed
    /// below the trigger threshold since the last sweep.
    pub fn spawn_focus_sweep(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let period = Duration::from_secs(u64::from(self.config.focus.sweep_interval_secs));
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick fires immediately; consume it so the first
            // real sweep happens one full period in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                coordinator.sweep_focus_at(Utc::now()).await;
            }
        })
    }

    /// Runs one focus sweep at the given instant, returning the alerts it
    /// raised after broadcasting them to teachers.
    pub async fn sweep_focus_at(&self, now: DateTime<Utc>) -> Vec<FocusAlert> {
        let (alerts, topic) = {
            let mut session = self.session.lock().await;
            let alerts = session.sweep_focus(now);
            let topic = session.active_topic().unwrap_or_else(|| IDLE_TOPIC.to_string());
            (alerts, topic)
        };

        for alert in &alerts {
            info!(student = %alert.student, score = alert.score, topic = %topic, "student struggling");
            self.registry
                .broadcast_to_role(
                    Role::Teacher,
                    &OutboundMessage::student_struggling(alert.student.clone(), topic.clone()),
                )
                .await;
        }
        alerts
    }

    // ------------------------------------------------------------------------
    // Snapshot & HTTP-facing Operations
    // ------------------------------------------------------------------------

    /// Builds the teacher dashboard payload.
    pub async fn dashboard(&self) -> DashboardData {
        let active_students = self.registry.count_for_role(Role::Student).await;
        self.session.lock().await.dashboard(active_students)
    }

    /// Builds the session-wide analytics payload.
    pub async fn analytics(&self) -> AnalyticsData {
        self.session.lock().await.analytics()
    }

    /// Records an answer reported over HTTP rather than the live poll
    /// flow. Returns the topic's difficulty entry and the answer total.
    pub async fn record_external_answer(
        &self,
        entry: AnswerLogEntry,
    ) -> (Option<DifficultyEntry>, usize) {
        self.session.lock().await.record_external_answer(entry)
    }

    /// Stores a generated summary without broadcasting it.
    pub async fn store_summary(
        &self,
        summary: impl Into<String>,
        teacher: impl Into<String>,
    ) -> SummaryRecord {
        self.session
            .lock()
            .await
            .store_summary(summary, teacher, Utc::now())
    }

    /// Broadcasts the current summary to all students.
    ///
    /// Returns the summary record and how many students it reached, or
    /// `None` if no summary has been stored yet.
    pub async fn publish_current_summary(&self) -> Option<(SummaryRecord, usize)> {
        let record = self.session.lock().await.current_summary().cloned()?;
        let frame = OutboundMessage::new_summary(
            record.summary.clone(),
            record.teacher.clone(),
            record.timestamp,
        );
        let delivered = self
            .registry
            .broadcast_to_role(Role::Student, &frame)
            .await;
        info!(teacher = %record.teacher, delivered, "stored summary published");
        Some((record, delivered))
    }

    /// The current summary, if one has been stored.
    pub async fn current_summary(&self) -> Option<SummaryRecord> {
        self.session.lock().await.current_summary().cloned()
    }

    /// Stored summaries, oldest first.
    pub async fn summary_history(&self) -> Vec<SummaryRecord> {
        self.session.lock().await.summary_history()
    }

    /// Credits an interaction to a student's focus score.
    pub async fn record_interaction(&self, student: &str) {
        self.session
            .lock()
            .await
            .record_interaction(student, Utc::now());
    }

    /// Applies idle decay for one student and reports the result.
    pub async fn check_focus(&self, student: &str) -> FocusCheck {
        self.session.lock().await.check_focus(student, Utc::now())
    }

    /// Names of currently connected students, sorted.
    pub async fn connected_students(&self) -> Vec<String> {
        self.registry.names_for_role(Role::Student).await
    }
}

// ============================================================================
// Tests
// ============================================================================
