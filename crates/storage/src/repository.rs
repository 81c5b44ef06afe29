use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{Quiz, QuizId, ScoreRecord, UserId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A quiz as shown on the catalog screen: identity and title, no questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: QuizId,
    pub title: String,
    pub question_count: u32,
}

/// Repository contract for quizzes.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist or replace a quiz, questions and options included.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError>;

    /// List all quizzes, title-sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be read.
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, StorageError>;
}

/// Repository contract for final scores.
///
/// One record per (user, quiz) pair; writing again overwrites, so the last
/// write wins.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Persist or overwrite the score for the record's (user, quiz) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_score(&self, record: &ScoreRecord) -> Result<(), StorageError>;

    /// Fetch the stored score for one (user, quiz) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_score(&self, user: &UserId, quiz: &QuizId) -> Result<ScoreRecord, StorageError>;

    /// List the user's scores, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be read.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ScoreRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    scores: Arc<Mutex<HashMap<(UserId, QuizId), ScoreRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id().clone(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut summaries: Vec<QuizSummary> = guard
            .values()
            .map(|quiz| QuizSummary {
                id: quiz.id().clone(),
                title: quiz.title().to_owned(),
                question_count: u32::try_from(quiz.total_questions()).unwrap_or(u32::MAX),
            })
            .collect();
        summaries.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }
}

#[async_trait]
impl ScoreRepository for InMemoryRepository {
    async fn upsert_score(&self, record: &ScoreRecord) -> Result<(), StorageError> {
        let mut guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            (record.user_id().clone(), record.quiz_id().clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn get_score(&self, user: &UserId, quiz: &QuizId) -> Result<ScoreRecord, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(user.clone(), quiz.clone()))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ScoreRecord>, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ScoreRecord> = guard
            .iter()
            .filter(|((owner, _), _)| owner == user)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by(|a, b| b.completed_at().cmp(&a.completed_at()));
        Ok(records)
    }
}

/// Aggregates quiz and score repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub scores: Arc<dyn ScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn ScoreRepository> = Arc::new(repo);
        Self { quizzes, scores }
    }
}
