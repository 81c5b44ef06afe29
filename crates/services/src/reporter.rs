use std::sync::Arc;

use async_trait::async_trait;

use quiz_core::model::ScoreRecord;
use storage::repository::ScoreRepository;

use crate::error::ReportError;

/// Durable sink for a session's final score.
///
/// Called exactly once per completed session, from a detached task; the
/// session's phase and displayed score are never affected by the outcome.
#[async_trait]
pub trait ResultReporter: Send + Sync {
    /// Write the record, overwriting any earlier result for the same
    /// (user, quiz) pair.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` when the durable write fails.
    async fn persist(&self, record: &ScoreRecord) -> Result<(), ReportError>;
}

/// `ResultReporter` backed by a score repository.
#[derive(Clone)]
pub struct RepositoryResultReporter {
    scores: Arc<dyn ScoreRepository>,
}

impl RepositoryResultReporter {
    #[must_use]
    pub fn new(scores: Arc<dyn ScoreRepository>) -> Self {
        Self { scores }
    }
}

#[async_trait]
impl ResultReporter for RepositoryResultReporter {
    async fn persist(&self, record: &ScoreRecord) -> Result<(), ReportError> {
        self.scores.upsert_score(record).await?;
        Ok(())
    }
}
