use sqlx::Row;

use quiz_core::model::{Question, Quiz, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, i64_from_usize, ser, u32_from_i64};
use crate::repository::{QuizRepository, QuizSummary, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO quizzes (id, title)
                VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET title = excluded.title
            ",
        )
        .bind(quiz.id().as_str())
        .bind(quiz.title())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Replace the question set wholesale; options cascade.
        sqlx::query("DELETE FROM questions WHERE quiz_id = ?1")
            .bind(quiz.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question) in quiz.questions().iter().enumerate() {
            let position = i64_from_usize("question position", position)?;

            sqlx::query(
                r"
                    INSERT INTO questions (quiz_id, position, prompt, correct_answer)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(quiz.id().as_str())
            .bind(position)
            .bind(question.prompt())
            .bind(question.correct_answer())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            for (option_position, text) in question.options().iter().enumerate() {
                let option_position = i64_from_usize("option position", option_position)?;

                sqlx::query(
                    r"
                        INSERT INTO question_options
                            (quiz_id, question_position, position, text)
                        VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(quiz.id().as_str())
                .bind(position)
                .bind(option_position)
                .bind(text)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)
    }

    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, StorageError> {
        let quiz_row = sqlx::query("SELECT title FROM quizzes WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        let title: String = quiz_row.try_get("title").map_err(ser)?;

        let question_rows = sqlx::query(
            r"
                SELECT position, prompt, correct_answer
                FROM questions
                WHERE quiz_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let option_rows = sqlx::query(
            r"
                SELECT question_position, text
                FROM question_options
                WHERE quiz_id = ?1
                ORDER BY question_position ASC, position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let position: i64 = row.try_get("position").map_err(ser)?;
            let prompt: String = row.try_get("prompt").map_err(ser)?;
            let correct_answer: String = row.try_get("correct_answer").map_err(ser)?;

            let mut options = Vec::new();
            for option_row in &option_rows {
                let question_position: i64 =
                    option_row.try_get("question_position").map_err(ser)?;
                if question_position == position {
                    options.push(option_row.try_get::<String, _>("text").map_err(ser)?);
                }
            }

            questions.push(Question::new(prompt, options, correct_answer).map_err(ser)?);
        }

        Quiz::new(id.clone(), title, questions).map_err(ser)
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT q.id, q.title, COUNT(que.position) AS question_count
                FROM quizzes q
                LEFT JOIN questions que ON que.quiz_id = q.id
                GROUP BY q.id, q.title
                ORDER BY q.title ASC, q.id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let title: String = row.try_get("title").map_err(ser)?;
            let question_count = u32_from_i64(
                "question_count",
                row.try_get::<i64, _>("question_count").map_err(ser)?,
            )?;

            out.push(QuizSummary {
                id: QuizId::new(id),
                title,
                question_count,
            });
        }

        Ok(out)
    }
}
