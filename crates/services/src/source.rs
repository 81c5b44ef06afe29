use std::sync::Arc;

use async_trait::async_trait;

use quiz_core::model::{Quiz, QuizId};
use storage::repository::{QuizRepository, StorageError};

use crate::error::SourceError;

/// Supplier of quiz content for a session.
///
/// A session subscribes once, at startup; implementations must deliver a
/// structurally valid quiz (the domain constructors enforce this) or an
/// error. The session engine never re-validates question content.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the quiz for one session.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::NotFound` when no quiz exists under `id`, or
    /// `SourceError::Unavailable` when the backing store cannot be reached.
    async fn fetch(&self, id: &QuizId) -> Result<Quiz, SourceError>;
}

/// `QuestionSource` backed by a quiz repository.
#[derive(Clone)]
pub struct RepositoryQuestionSource {
    quizzes: Arc<dyn QuizRepository>,
}

impl RepositoryQuestionSource {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { quizzes }
    }
}

#[async_trait]
impl QuestionSource for RepositoryQuestionSource {
    async fn fetch(&self, id: &QuizId) -> Result<Quiz, SourceError> {
        self.quizzes.get_quiz(id).await.map_err(|e| match e {
            StorageError::NotFound => SourceError::NotFound,
            other => SourceError::Unavailable(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Question;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn fetch_returns_stored_quiz() {
        let repo = InMemoryRepository::new();
        let quiz = Quiz::new(
            QuizId::new("q1"),
            "Capitals",
            vec![Question::new("Capital of Peru?", vec!["Lima".into(), "Cusco".into()], "Lima")
                .unwrap()],
        )
        .unwrap();
        repo.upsert_quiz(&quiz).await.unwrap();

        let source = RepositoryQuestionSource::new(Arc::new(repo));
        let fetched = source.fetch(&QuizId::new("q1")).await.unwrap();
        assert_eq!(fetched, quiz);
    }

    #[tokio::test]
    async fn missing_quiz_maps_to_not_found() {
        let source = RepositoryQuestionSource::new(Arc::new(InMemoryRepository::new()));
        let err = source.fetch(&QuizId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound));
    }
}
