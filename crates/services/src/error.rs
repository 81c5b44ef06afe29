//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::ScoreRecordError;
use storage::repository::StorageError;

/// Errors emitted by a question source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("quiz not found")]
    NotFound,

    #[error("question source unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by the session engine.
///
/// Only `QuizUnavailable` is fatal to a session; it drives the phase to
/// `Failed`. Everything else leaves the session state untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz unavailable: {0}")]
    QuizUnavailable(#[from] SourceError),

    #[error("session was already started")]
    AlreadyStarted,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,
}

/// Errors emitted while persisting a final score.
///
/// Reported on the session's event stream; never fed back into the state
/// machine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("no authenticated user to record the score for")]
    AuthRequired,

    #[error(transparent)]
    InvalidRecord(#[from] ScoreRecordError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by catalog and score-history queries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
