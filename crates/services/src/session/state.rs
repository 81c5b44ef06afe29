use quiz_core::model::Quiz;
use quiz_core::scorer;

use crate::error::SessionError;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Discrete lifecycle state of a quiz session.
///
/// Transitions run forward (`Loading → Presenting → Completed`), except that
/// an explicit retry goes back from `Completed` to `Presenting`, and an
/// unrecoverable data error puts any phase into the terminal `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Presenting,
    Completed,
    Failed,
}

/// What triggered an advance: the user, or the countdown reaching zero.
///
/// Both score identically; the distinction only matters to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    Manual,
    Timeout,
}

/// Result of an advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The session was not presenting a question; nothing changed.
    Ignored,
    /// The current question was scored and the session moved to `index`.
    Next { index: usize, was_correct: bool },
    /// The last question was scored and the session completed.
    ///
    /// Returned exactly once per completion; persistence is keyed on it.
    Finished {
        score: u32,
        total_questions: u32,
        was_correct: bool,
    },
}

/// Result of recording a countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not presenting a question; the tick was stale.
    Ignored,
    Updated { remaining_seconds: u32 },
    /// The countdown hit zero; the caller advances with
    /// [`AdvanceReason::Timeout`].
    Expired,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Session tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    seconds_per_question: u32,
}

impl SessionSettings {
    pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidSecondsPerQuestion` for a zero limit.
    pub fn new(seconds_per_question: u32) -> Result<Self, SessionError> {
        if seconds_per_question == 0 {
            return Err(SessionError::InvalidSecondsPerQuestion);
        }
        Ok(Self {
            seconds_per_question,
        })
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seconds_per_question: Self::DEFAULT_SECONDS_PER_QUESTION,
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's run through one quiz.
///
/// All mutable session state lives here and is touched only through these
/// operations; every operation guards on the phase, so events that arrive
/// out of order (a stale timeout after completion, a selection after failure)
/// fall through as no-ops instead of corrupting state. Whichever of a manual
/// advance and a timer-driven advance is processed first wins; the loser
/// observes the changed phase or index and is discarded, which is what makes
/// double scoring impossible.
#[derive(Debug)]
pub struct QuizSession {
    settings: SessionSettings,
    phase: Phase,
    quiz: Option<Quiz>,
    current_index: usize,
    selected_option: Option<String>,
    score: u32,
    remaining_seconds: u32,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            phase: Phase::Loading,
            quiz: None,
            current_index: 0,
            selected_option: None,
            score: 0,
            remaining_seconds: settings.seconds_per_question(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// Index of the question on screen; meaningful while `Presenting`.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&quiz_core::model::Question> {
        self.quiz.as_ref()?.question(self.current_index)
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<&str> {
        self.selected_option.as_deref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin presenting the loaded quiz.
    ///
    /// The quiz type guarantees a non-empty question list, so a successful
    /// start always lands on question 0.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is still
    /// `Loading`; a later quiz payload must not replace a running session's
    /// content.
    pub fn start(&mut self, quiz: Quiz) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Err(SessionError::AlreadyStarted);
        }
        self.quiz = Some(quiz);
        self.current_index = 0;
        self.score = 0;
        self.selected_option = None;
        self.remaining_seconds = self.settings.seconds_per_question();
        self.phase = Phase::Presenting;
        Ok(())
    }

    /// Record an unrecoverable data error; terminal.
    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
    }

    /// Set the pending selection for the current question.
    ///
    /// Overwrites any earlier pick; repeatable until the question advances.
    /// Returns false (and changes nothing) outside `Presenting`.
    pub fn select_option(&mut self, option: impl Into<String>) -> bool {
        if self.phase != Phase::Presenting {
            return false;
        }
        self.selected_option = Some(option.into());
        true
    }

    /// Score the current question and move on, or complete the session.
    ///
    /// A missing selection scores as incorrect. Outside `Presenting` this is
    /// a guaranteed no-op, returning [`AdvanceOutcome::Ignored`].
    pub fn advance(&mut self, reason: AdvanceReason) -> AdvanceOutcome {
        if self.phase != Phase::Presenting {
            tracing::debug!(?reason, "advance ignored outside presenting phase");
            return AdvanceOutcome::Ignored;
        }
        let Some(quiz) = self.quiz.as_ref() else {
            return AdvanceOutcome::Ignored;
        };
        let Some(question) = quiz.question(self.current_index) else {
            return AdvanceOutcome::Ignored;
        };

        let was_correct = scorer::is_correct(question, self.selected_option.as_deref());
        let is_last = quiz.is_last_question(self.current_index);
        let total_questions = u32::try_from(quiz.total_questions()).unwrap_or(u32::MAX);

        if was_correct {
            self.score += 1;
        }
        self.selected_option = None;

        if is_last {
            self.phase = Phase::Completed;
            AdvanceOutcome::Finished {
                score: self.score,
                total_questions,
                was_correct,
            }
        } else {
            self.current_index += 1;
            self.remaining_seconds = self.settings.seconds_per_question();
            AdvanceOutcome::Next {
                index: self.current_index,
                was_correct,
            }
        }
    }

    /// Record a countdown tick for the current question.
    pub fn record_tick(&mut self, remaining_seconds: u32) -> TickOutcome {
        if self.phase != Phase::Presenting {
            return TickOutcome::Ignored;
        }
        self.remaining_seconds = remaining_seconds;
        if remaining_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Updated { remaining_seconds }
        }
    }

    /// Run the same quiz again from the top.
    ///
    /// Resets score, position, selection and countdown in place. Returns
    /// false (and changes nothing) unless the session is `Completed`.
    pub fn retry(&mut self) -> bool {
        if self.phase != Phase::Completed {
            return false;
        }
        self.current_index = 0;
        self.score = 0;
        self.selected_option = None;
        self.remaining_seconds = self.settings.seconds_per_question();
        self.phase = Phase::Presenting;
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
