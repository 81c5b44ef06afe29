use sqlx::Row;

use quiz_core::model::{QuizId, ScoreRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, ser, u32_from_i64};
use crate::repository::{ScoreRepository, StorageError};

fn map_score_row(row: &sqlx::sqlite::SqliteRow) -> Result<ScoreRecord, StorageError> {
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let quiz_id: String = row.try_get("quiz_id").map_err(ser)?;
    let quiz_title: String = row.try_get("quiz_title").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    ScoreRecord::from_persisted(
        UserId::new(user_id),
        QuizId::new(quiz_id),
        quiz_title,
        score,
        total_questions,
        completed_at,
    )
    .map_err(ser)
}

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn upsert_score(&self, record: &ScoreRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO scores (
                    user_id, quiz_id, quiz_title, score, total_questions, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(user_id, quiz_id) DO UPDATE SET
                    quiz_title = excluded.quiz_title,
                    score = excluded.score,
                    total_questions = excluded.total_questions,
                    completed_at = excluded.completed_at
            ",
        )
        .bind(record.user_id().as_str())
        .bind(record.quiz_id().as_str())
        .bind(record.quiz_title())
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total_questions()))
        .bind(record.completed_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_score(&self, user: &UserId, quiz: &QuizId) -> Result<ScoreRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, quiz_id, quiz_title, score, total_questions, completed_at
                FROM scores
                WHERE user_id = ?1 AND quiz_id = ?2
            ",
        )
        .bind(user.as_str())
        .bind(quiz.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_score_row(&row)
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<ScoreRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, quiz_id, quiz_title, score, total_questions, completed_at
                FROM scores
                WHERE user_id = ?1
                ORDER BY completed_at DESC, quiz_id ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_score_row(&row)?);
        }

        Ok(out)
    }
}
