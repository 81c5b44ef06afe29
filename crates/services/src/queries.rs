use std::sync::Arc;

use quiz_core::model::{ScoreRecord, UserId};
use storage::repository::{QuizRepository, QuizSummary, ScoreRepository};

use crate::error::QueryError;

/// Read-side listing of available quizzes for the catalog screen.
#[derive(Clone)]
pub struct QuizCatalogService {
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizCatalogService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }

    /// List all quizzes, title-sorted.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Storage` when the backend cannot be read.
    pub async fn list(&self) -> Result<Vec<QuizSummary>, QueryError> {
        Ok(self.quizzes.list_quizzes().await?)
    }
}

/// Read-side listing of a user's stored results for the history screen.
///
/// Storage keeps one row per quiz (last write wins), so this is one entry per
/// quiz the user has ever completed.
#[derive(Clone)]
pub struct ScoreHistoryService {
    scores: Arc<dyn ScoreRepository>,
}

impl ScoreHistoryService {
    #[must_use]
    pub fn new(scores: Arc<dyn ScoreRepository>) -> Self {
        Self { scores }
    }

    /// List the user's scores, most recently completed first.
    ///
    /// An empty list means the user has not completed any quiz yet.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Storage` when the backend cannot be read.
    pub async fn list_for_user(&self, user: &UserId) -> Result<Vec<ScoreRecord>, QueryError> {
        Ok(self.scores.list_for_user(user).await?)
    }
}
