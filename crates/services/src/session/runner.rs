use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use quiz_core::Clock;
use quiz_core::model::{QuizId, ScoreRecord, UserId};

use crate::analytics::{AnalyticsEvent, AnalyticsSink, NoopAnalytics};
use crate::auth::AuthProvider;
use crate::error::{ReportError, SessionError};
use crate::reporter::ResultReporter;
use crate::source::QuestionSource;

use super::state::{AdvanceOutcome, AdvanceReason, QuizSession, SessionSettings, TickOutcome};
use super::timer::{QuestionTimer, TimerMessage};

//
// ─── COMMANDS AND EVENTS ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
enum SessionCommand {
    SelectOption(String),
    Advance,
    Retry,
}

/// Notifications emitted by a running session.
///
/// This stream is the consumer's whole window into the session, and also the
/// separate channel on which the detached persistence task reports its
/// outcome. A persistence failure arrives here and nowhere else; it never
/// feeds back into the state machine.
#[derive(Debug)]
pub enum SessionEvent {
    Loaded {
        quiz_id: QuizId,
        title: String,
        total_questions: u32,
    },
    /// The quiz could not be loaded; the session is terminally failed.
    LoadFailed { error: SessionError },
    /// A question is on screen with a freshly reset countdown.
    QuestionPresented {
        index: usize,
        remaining_seconds: u32,
    },
    TimerTick {
        index: usize,
        remaining_seconds: u32,
    },
    Completed {
        score: u32,
        total_questions: u32,
    },
    ScorePersisted { user_id: UserId },
    PersistFailed { error: ReportError },
}

/// Cloneable handle for driving a spawned session.
///
/// Commands are queued onto the session's single event queue; sending never
/// blocks. Dropping every handle ends the session loop and cancels any live
/// timer.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Record a pending selection for the question on screen.
    pub fn select_option(&self, option: impl Into<String>) {
        let _ = self.commands.send(SessionCommand::SelectOption(option.into()));
    }

    /// Score the question on screen and move on.
    pub fn advance(&self) {
        let _ = self.commands.send(SessionCommand::Advance);
    }

    /// Restart a completed session from the first question.
    pub fn retry(&self) {
        let _ = self.commands.send(SessionCommand::Retry);
    }
}

//
// ─── RUNNER ────────────────────────────────────────────────────────────────────
//

/// Builder for a session's collaborators; `spawn` starts the loop.
pub struct SessionRunner {
    source: Arc<dyn QuestionSource>,
    auth: Arc<dyn AuthProvider>,
    reporter: Arc<dyn ResultReporter>,
    analytics: Arc<dyn AnalyticsSink>,
    clock: Clock,
    settings: SessionSettings,
    tick_interval: Duration,
}

impl SessionRunner {
    #[must_use]
    pub fn new(
        source: Arc<dyn QuestionSource>,
        auth: Arc<dyn AuthProvider>,
        reporter: Arc<dyn ResultReporter>,
    ) -> Self {
        Self {
            source,
            auth,
            reporter,
            analytics: Arc::new(NoopAnalytics),
            clock: Clock::default(),
            settings: SessionSettings::default(),
            tick_interval: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the countdown resolution (one second in production; tests
    /// shorten it to drive timeouts quickly).
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// Start a session for `quiz_id` on its own task.
    ///
    /// Returns a command handle and the event stream. All session mutations,
    /// user commands and timer ticks alike, are serialized through the
    /// spawned loop, so no two ever execute concurrently.
    #[must_use]
    pub fn spawn(
        self,
        quiz_id: QuizId,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let session_loop = SessionLoop {
            source: self.source,
            auth: self.auth,
            reporter: self.reporter,
            analytics: self.analytics,
            clock: self.clock,
            settings: self.settings,
            tick_interval: self.tick_interval,
            quiz_id,
            quiz_title: String::new(),
            session: QuizSession::new(self.settings),
            timer: None,
            epoch: 0,
            timer_tx,
            events: event_tx,
        };
        tokio::spawn(session_loop.run(command_rx, timer_rx));

        (
            SessionHandle {
                commands: command_tx,
            },
            event_rx,
        )
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

struct SessionLoop {
    source: Arc<dyn QuestionSource>,
    auth: Arc<dyn AuthProvider>,
    reporter: Arc<dyn ResultReporter>,
    analytics: Arc<dyn AnalyticsSink>,
    clock: Clock,
    settings: SessionSettings,
    tick_interval: Duration,
    quiz_id: QuizId,
    quiz_title: String,
    session: QuizSession,
    timer: Option<QuestionTimer>,
    epoch: u64,
    timer_tx: mpsc::UnboundedSender<TimerMessage>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerMessage>,
    ) {
        self.load().await;

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    // Every handle is gone; tear the session down.
                    None => break,
                },
                Some(message) = timer_rx.recv() => self.handle_timer(message),
            }
        }

        self.cancel_timer();
        debug!(quiz_id = %self.quiz_id, "session loop ended");
    }

    async fn load(&mut self) {
        self.analytics
            .record(AnalyticsEvent::screen_view(&format!("quiz_{}", self.quiz_id)));

        match self.source.fetch(&self.quiz_id).await {
            Ok(quiz) => {
                self.quiz_title = quiz.title().to_owned();
                let total_questions =
                    u32::try_from(quiz.total_questions()).unwrap_or(u32::MAX);
                self.analytics
                    .record(AnalyticsEvent::quiz_start(&self.quiz_id, quiz.title()));

                if let Err(error) = self.session.start(quiz) {
                    debug!(%error, "ignoring duplicate quiz payload");
                    return;
                }

                self.emit(SessionEvent::Loaded {
                    quiz_id: self.quiz_id.clone(),
                    title: self.quiz_title.clone(),
                    total_questions,
                });
                self.restart_timer();
                self.emit(SessionEvent::QuestionPresented {
                    index: 0,
                    remaining_seconds: self.settings.seconds_per_question(),
                });
            }
            Err(source_error) => {
                self.session.fail();
                let error = SessionError::QuizUnavailable(source_error);
                warn!(quiz_id = %self.quiz_id, %error, "quiz load failed");
                self.emit(SessionEvent::LoadFailed { error });
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SelectOption(option) => {
                let question_number = self.session.current_index() + 1;
                if self.session.select_option(option.clone()) {
                    self.analytics.record(AnalyticsEvent::select_option(
                        &self.quiz_id,
                        question_number,
                        &option,
                    ));
                }
            }
            SessionCommand::Advance => self.advance(AdvanceReason::Manual),
            SessionCommand::Retry => {
                if self.session.retry() {
                    self.analytics.record(AnalyticsEvent::quiz_retry(&self.quiz_id));
                    self.restart_timer();
                    self.emit(SessionEvent::QuestionPresented {
                        index: 0,
                        remaining_seconds: self.settings.seconds_per_question(),
                    });
                }
            }
        }
    }

    fn handle_timer(&mut self, message: TimerMessage) {
        // A tick from anything but the live timer is stale by definition.
        if self.timer.as_ref().map(QuestionTimer::epoch) != Some(message.epoch) {
            debug!(epoch = message.epoch, "discarding stale timer message");
            return;
        }

        match self.session.record_tick(message.remaining) {
            TickOutcome::Updated { remaining_seconds } => {
                self.emit(SessionEvent::TimerTick {
                    index: self.session.current_index(),
                    remaining_seconds,
                });
            }
            TickOutcome::Expired => self.advance(AdvanceReason::Timeout),
            TickOutcome::Ignored => {}
        }
    }

    fn advance(&mut self, reason: AdvanceReason) {
        let question_number = self.session.current_index() + 1;

        match self.session.advance(reason) {
            AdvanceOutcome::Ignored => {}
            AdvanceOutcome::Next { index, was_correct } => {
                self.analytics.record(AnalyticsEvent::answer_question(
                    &self.quiz_id,
                    question_number,
                    was_correct,
                ));
                self.restart_timer();
                self.emit(SessionEvent::QuestionPresented {
                    index,
                    remaining_seconds: self.settings.seconds_per_question(),
                });
            }
            AdvanceOutcome::Finished {
                score,
                total_questions,
                was_correct,
            } => {
                self.cancel_timer();
                self.analytics.record(AnalyticsEvent::answer_question(
                    &self.quiz_id,
                    question_number,
                    was_correct,
                ));
                self.analytics.record(AnalyticsEvent::quiz_complete(
                    &self.quiz_id,
                    score,
                    total_questions,
                ));
                self.emit(SessionEvent::Completed {
                    score,
                    total_questions,
                });
                self.spawn_persist(score, total_questions);
            }
        }
    }

    /// Cancel the outstanding countdown and start one for the question on
    /// screen. The epoch bump is what retires in-flight ticks from the old
    /// timer.
    fn restart_timer(&mut self) {
        self.cancel_timer();
        self.epoch += 1;
        self.timer = Some(QuestionTimer::start(
            self.settings.seconds_per_question(),
            self.epoch,
            self.tick_interval,
            self.timer_tx.clone(),
        ));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Persist the final score on a detached task, exactly once per
    /// completion. The task reports on the event stream; it cannot reach
    /// back into the session, and nothing awaits it.
    fn spawn_persist(&self, score: u32, total_questions: u32) {
        let auth = Arc::clone(&self.auth);
        let reporter = Arc::clone(&self.reporter);
        let events = self.events.clone();
        let clock = self.clock;
        let quiz_id = self.quiz_id.clone();
        let quiz_title = self.quiz_title.clone();

        tokio::spawn(async move {
            let Some(user_id) = auth.current_user() else {
                warn!(%quiz_id, "score not persisted: no authenticated user");
                let _ = events.send(SessionEvent::PersistFailed {
                    error: ReportError::AuthRequired,
                });
                return;
            };

            let result = match ScoreRecord::new(
                user_id.clone(),
                quiz_id.clone(),
                quiz_title,
                score,
                total_questions,
                clock.now(),
            ) {
                Ok(record) => reporter.persist(&record).await,
                Err(invalid) => Err(ReportError::from(invalid)),
            };

            match result {
                Ok(()) => {
                    let _ = events.send(SessionEvent::ScorePersisted { user_id });
                }
                Err(error) => {
                    warn!(%quiz_id, %error, "failed to persist final score");
                    let _ = events.send(SessionEvent::PersistFailed { error });
                }
            }
        });
    }

    fn emit(&self, event: SessionEvent) {
        // The consumer may have dropped the event stream; that is its choice.
        let _ = self.events.send(event);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use quiz_core::model::{Question, Quiz};
    use quiz_core::time::{fixed_clock, fixed_now};

    use crate::auth::StaticAuthProvider;
    use crate::error::SourceError;
    use crate::source::QuestionSource;

    const EVENT_WAIT: Duration = Duration::from_secs(5);
    // Long enough that no tick fires during a command-driven test.
    const IDLE_TICK: Duration = Duration::from_secs(600);

    fn build_quiz(questions: usize) -> Quiz {
        let questions = (0..questions)
            .map(|i| {
                Question::new(
                    format!("Question {i}?"),
                    vec!["Right".into(), "Wrong".into()],
                    "Right",
                )
                .unwrap()
            })
            .collect();
        Quiz::new(QuizId::new("quiz-1"), "Sample Quiz", questions).unwrap()
    }

    struct StaticSource {
        quiz: Quiz,
    }

    #[async_trait]
    impl QuestionSource for StaticSource {
        async fn fetch(&self, _id: &QuizId) -> Result<Quiz, SourceError> {
            Ok(self.quiz.clone())
        }
    }

    struct MissingSource;

    #[async_trait]
    impl QuestionSource for MissingSource {
        async fn fetch(&self, _id: &QuizId) -> Result<Quiz, SourceError> {
            Err(SourceError::NotFound)
        }
    }

    #[derive(Default)]
    struct CaptureReporter {
        records: Mutex<Vec<ScoreRecord>>,
        fail_with_connection_error: bool,
    }

    impl CaptureReporter {
        fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail_with_connection_error: true,
            }
        }

        fn recorded(&self) -> Vec<ScoreRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResultReporter for CaptureReporter {
        async fn persist(&self, record: &ScoreRecord) -> Result<(), ReportError> {
            if self.fail_with_connection_error {
                return Err(ReportError::Storage(
                    storage::repository::StorageError::Connection("offline".into()),
                ));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CaptureAnalytics {
        names: Mutex<Vec<&'static str>>,
    }

    impl CaptureAnalytics {
        fn names(&self) -> Vec<&'static str> {
            self.names.lock().unwrap().clone()
        }
    }

    impl AnalyticsSink for CaptureAnalytics {
        fn record(&self, event: AnalyticsEvent) {
            self.names.lock().unwrap().push(event.name);
        }
    }

    fn runner(
        quiz: Quiz,
        reporter: Arc<CaptureReporter>,
        tick_interval: Duration,
    ) -> SessionRunner {
        SessionRunner::new(
            Arc::new(StaticSource { quiz }),
            Arc::new(StaticAuthProvider::signed_in(UserId::new("uid-1"))),
            reporter,
        )
        .with_clock(fixed_clock())
        .with_tick_interval(tick_interval)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(EVENT_WAIT, rx.recv())
            .await
            .expect("timed out waiting for a session event")
            .expect("event stream closed unexpectedly")
    }

    /// Receive events until `matches` accepts one, failing on timeout.
    async fn wait_for(
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
        matches: impl Fn(&SessionEvent) -> bool,
    ) -> SessionEvent {
        loop {
            let event = next_event(rx).await;
            if matches(&event) {
                return event;
            }
        }
    }

    #[tokio::test]
    async fn manual_run_scores_and_persists_once() {
        let reporter = Arc::new(CaptureReporter::default());
        let (handle, mut rx) = runner(build_quiz(2), reporter.clone(), IDLE_TICK)
            .spawn(QuizId::new("quiz-1"));

        let loaded = next_event(&mut rx).await;
        assert!(matches!(
            loaded,
            SessionEvent::Loaded { total_questions: 2, .. }
        ));
        let presented = next_event(&mut rx).await;
        assert!(matches!(
            presented,
            SessionEvent::QuestionPresented { index: 0, remaining_seconds: 30 }
        ));

        handle.select_option("Right");
        handle.advance();
        let presented = next_event(&mut rx).await;
        assert!(matches!(
            presented,
            SessionEvent::QuestionPresented { index: 1, remaining_seconds: 30 }
        ));

        handle.select_option("Wrong");
        handle.advance();
        let completed = next_event(&mut rx).await;
        assert!(matches!(
            completed,
            SessionEvent::Completed { score: 1, total_questions: 2 }
        ));

        let persisted = wait_for(&mut rx, |e| {
            matches!(e, SessionEvent::ScorePersisted { .. })
        })
        .await;
        assert!(matches!(
            persisted,
            SessionEvent::ScorePersisted { ref user_id } if user_id == &UserId::new("uid-1")
        ));

        let records = reporter.recorded();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score(), 1);
        assert_eq!(records[0].total_questions(), 2);
        assert_eq!(records[0].quiz_title(), "Sample Quiz");
        assert_eq!(records[0].completed_at(), fixed_now());
    }

    #[tokio::test]
    async fn unanswered_countdown_expiry_completes_the_session() {
        let reporter = Arc::new(CaptureReporter::default());
        let settings = SessionSettings::new(2).unwrap();
        let (_handle, mut rx) = runner(build_quiz(1), reporter.clone(), Duration::from_millis(10))
            .with_settings(settings)
            .spawn(QuizId::new("quiz-1"));

        let completed = wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
        assert!(matches!(
            completed,
            SessionEvent::Completed { score: 0, total_questions: 1 }
        ));

        wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;
        let records = reporter.recorded();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score(), 0);
    }

    #[tokio::test]
    async fn countdown_ticks_are_observable() {
        let reporter = Arc::new(CaptureReporter::default());
        let settings = SessionSettings::new(3).unwrap();
        let (_handle, mut rx) = runner(build_quiz(1), reporter, Duration::from_millis(10))
            .with_settings(settings)
            .spawn(QuizId::new("quiz-1"));

        let tick = wait_for(&mut rx, |e| matches!(e, SessionEvent::TimerTick { .. })).await;
        assert!(matches!(
            tick,
            SessionEvent::TimerTick { index: 0, remaining_seconds: 2 }
        ));
    }

    #[tokio::test]
    async fn double_advance_on_the_last_question_persists_once() {
        let reporter = Arc::new(CaptureReporter::default());
        let (handle, mut rx) = runner(build_quiz(1), reporter.clone(), IDLE_TICK)
            .spawn(QuizId::new("quiz-1"));

        // Both advances are queued before the first is processed; the second
        // lands on a completed session and must be a no-op.
        handle.advance();
        handle.advance();

        wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
        wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(reporter.recorded().len(), 1);
    }

    #[tokio::test]
    async fn retry_restarts_and_a_second_completion_overwrites() {
        let reporter = Arc::new(CaptureReporter::default());
        let (handle, mut rx) = runner(build_quiz(1), reporter.clone(), IDLE_TICK)
            .spawn(QuizId::new("quiz-1"));

        handle.select_option("Wrong");
        handle.advance();
        wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;

        handle.retry();
        let presented = wait_for(&mut rx, |e| {
            matches!(e, SessionEvent::QuestionPresented { .. })
        })
        .await;
        assert!(matches!(
            presented,
            SessionEvent::QuestionPresented { index: 0, remaining_seconds: 30 }
        ));

        handle.select_option("Right");
        handle.advance();
        let completed = wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
        assert!(matches!(
            completed,
            SessionEvent::Completed { score: 1, total_questions: 1 }
        ));

        wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;
        let records = reporter.recorded();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].score(), 0);
        assert_eq!(records[1].score(), 1);
    }

    #[tokio::test]
    async fn completion_without_a_user_reports_auth_required() {
        let reporter = Arc::new(CaptureReporter::default());
        let runner = SessionRunner::new(
            Arc::new(StaticSource { quiz: build_quiz(1) }),
            Arc::new(StaticAuthProvider::signed_out()),
            reporter.clone(),
        )
        .with_tick_interval(IDLE_TICK);
        let (handle, mut rx) = runner.spawn(QuizId::new("quiz-1"));

        handle.advance();
        wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;

        let failed = wait_for(&mut rx, |e| matches!(e, SessionEvent::PersistFailed { .. })).await;
        assert!(matches!(
            failed,
            SessionEvent::PersistFailed { error: ReportError::AuthRequired }
        ));
        assert!(reporter.recorded().is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_leaves_the_completed_session_usable() {
        let reporter = Arc::new(CaptureReporter::failing());
        let (handle, mut rx) = runner(build_quiz(1), reporter, IDLE_TICK)
            .spawn(QuizId::new("quiz-1"));

        handle.advance();
        wait_for(&mut rx, |e| matches!(e, SessionEvent::Completed { .. })).await;
        let failed = wait_for(&mut rx, |e| matches!(e, SessionEvent::PersistFailed { .. })).await;
        assert!(matches!(
            failed,
            SessionEvent::PersistFailed { error: ReportError::Storage(_) }
        ));

        // The failure is advisory: the session is still completed and can be
        // retried.
        handle.retry();
        wait_for(&mut rx, |e| matches!(e, SessionEvent::QuestionPresented { .. })).await;
    }

    #[tokio::test]
    async fn missing_quiz_fails_the_session_terminally() {
        let reporter = Arc::new(CaptureReporter::default());
        let runner = SessionRunner::new(
            Arc::new(MissingSource),
            Arc::new(StaticAuthProvider::signed_in(UserId::new("uid-1"))),
            reporter.clone(),
        );
        let (handle, mut rx) = runner.spawn(QuizId::new("ghost"));

        let failed = next_event(&mut rx).await;
        assert!(matches!(
            failed,
            SessionEvent::LoadFailed {
                error: SessionError::QuizUnavailable(SourceError::NotFound)
            }
        ));

        // Commands against a failed session do nothing.
        handle.select_option("Right");
        handle.advance();
        handle.retry();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert!(reporter.recorded().is_empty());
    }

    #[tokio::test]
    async fn analytics_sees_the_whole_run() {
        let reporter = Arc::new(CaptureReporter::default());
        let analytics = Arc::new(CaptureAnalytics::default());
        let (handle, mut rx) = runner(build_quiz(1), reporter, IDLE_TICK)
            .with_analytics(analytics.clone())
            .spawn(QuizId::new("quiz-1"));

        handle.select_option("Right");
        handle.advance();
        wait_for(&mut rx, |e| matches!(e, SessionEvent::ScorePersisted { .. })).await;

        let names = analytics.names();
        for expected in ["screen_view", "quiz_start", "select_option", "answer_question", "quiz_complete"] {
            assert!(names.contains(&expected), "missing {expected} in {names:?}");
        }
    }
}
