use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuizId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreRecordError {
    #[error("score ({score}) exceeds total questions ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("a score record needs at least one question")]
    NoQuestions,

    #[error("quiz title cannot be empty")]
    EmptyTitle,
}

//
// ─── SCORE RECORD ──────────────────────────────────────────────────────────────
//

/// The durable result of one completed quiz run.
///
/// Storage keeps one record per (user, quiz) pair; a later run overwrites an
/// earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    user_id: UserId,
    quiz_id: QuizId,
    quiz_title: String,
    score: u32,
    total_questions: u32,
    completed_at: DateTime<Utc>,
}

impl ScoreRecord {
    /// Creates a new score record.
    ///
    /// # Errors
    ///
    /// Returns `ScoreRecordError::NoQuestions` for a zero question count,
    /// `ScoreRecordError::ScoreExceedsTotal` when the score is larger than
    /// the question count, and `ScoreRecordError::EmptyTitle` for a blank
    /// title.
    pub fn new(
        user_id: UserId,
        quiz_id: QuizId,
        quiz_title: impl Into<String>,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreRecordError> {
        let quiz_title = quiz_title.into();
        if quiz_title.trim().is_empty() {
            return Err(ScoreRecordError::EmptyTitle);
        }
        if total_questions == 0 {
            return Err(ScoreRecordError::NoQuestions);
        }
        if score > total_questions {
            return Err(ScoreRecordError::ScoreExceedsTotal {
                score,
                total: total_questions,
            });
        }

        Ok(Self {
            user_id,
            quiz_id,
            quiz_title: quiz_title.trim().to_owned(),
            score,
            total_questions,
            completed_at,
        })
    }

    /// Rehydrates a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Same validation as [`ScoreRecord::new`]; stored rows that no longer
    /// satisfy it are treated as corrupt.
    pub fn from_persisted(
        user_id: UserId,
        quiz_id: QuizId,
        quiz_title: impl Into<String>,
        score: u32,
        total_questions: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ScoreRecordError> {
        Self::new(
            user_id,
            quiz_id,
            quiz_title,
            score,
            total_questions,
            completed_at,
        )
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> &QuizId {
        &self.quiz_id
    }

    #[must_use]
    pub fn quiz_title(&self) -> &str {
        &self.quiz_title
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Fraction of questions answered correctly, in `0.0..=1.0`.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.score) / f64::from(self.total_questions)
    }

    /// Whether the run cleared the passing bar (strictly more than half).
    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.percentage() > 0.5
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
