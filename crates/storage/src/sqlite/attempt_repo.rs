use std::collections::BTreeMap;

use quiz_core::model::{QuizId, QuizResult};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    id_i64, quiz_id_from_i64, ser, trigger_from_i64, trigger_to_i64, u32_from_i64, usize_from_i64,
};
use crate::repository::{AttemptRepository, AttemptRow, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let quiz_id = id_i64("quiz_id", result.quiz_id().value())?;
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
            INSERT INTO attempts (
                quiz_id, score, time_spent_seconds, started_at, submitted_at, submit_trigger
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(quiz_id)
        .bind(i64::from(result.score()))
        .bind(i64::from(result.time_spent_seconds()))
        .bind(result.started_at())
        .bind(result.submitted_at())
        .bind(trigger_to_i64(result.trigger()))
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let attempt_id = res.last_insert_rowid();

        for (&question_index, &option_index) in result.answers() {
            sqlx::query(
                r"
                INSERT INTO attempt_answers (attempt_id, question_index, option_index)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(attempt_id)
            .bind(
                i64::try_from(question_index)
                    .map_err(|_| StorageError::Serialization("question_index overflow".into()))?,
            )
            .bind(
                i64::try_from(option_index)
                    .map_err(|_| StorageError::Serialization("option_index overflow".into()))?,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(attempt_id)
    }

    async fn get_attempt(&self, id: i64) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, quiz_id, score, time_spent_seconds, started_at, submitted_at, submit_trigger
            FROM attempts
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        let answers = self.load_answers(id).await?;
        map_attempt_row(&row, answers)
    }

    async fn list_attempt_rows(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, quiz_id, score, time_spent_seconds, started_at, submitted_at, submit_trigger
            FROM attempts
            WHERE quiz_id = ?1
            ORDER BY submitted_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let answers = self.load_answers(id).await?;
            out.push(AttemptRow {
                id,
                result: map_attempt_row(&row, answers)?,
            });
        }
        Ok(out)
    }
}

impl SqliteRepository {
    async fn load_answers(&self, attempt_id: i64) -> Result<BTreeMap<usize, usize>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_index, option_index
            FROM attempt_answers
            WHERE attempt_id = ?1
            ",
        )
        .bind(attempt_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut answers = BTreeMap::new();
        for row in rows {
            let question = usize_from_i64(
                "question_index",
                row.try_get::<i64, _>("question_index").map_err(ser)?,
            )?;
            let option = usize_from_i64(
                "option_index",
                row.try_get::<i64, _>("option_index").map_err(ser)?,
            )?;
            answers.insert(question, option);
        }
        Ok(answers)
    }
}

fn map_attempt_row(
    row: &sqlx::sqlite::SqliteRow,
    answers: BTreeMap<usize, usize>,
) -> Result<QuizResult, StorageError> {
    let score_i64: i64 = row.try_get("score").map_err(ser)?;
    let score = u8::try_from(score_i64)
        .map_err(|_| StorageError::Serialization(format!("invalid score: {score_i64}")))?;

    QuizResult::from_persisted(
        quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        answers,
        score,
        u32_from_i64(
            "time_spent_seconds",
            row.try_get::<i64, _>("time_spent_seconds").map_err(ser)?,
        )?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("submitted_at").map_err(ser)?,
        trigger_from_i64(row.try_get::<i64, _>("submit_trigger").map_err(ser)?)?,
    )
    .map_err(ser)
}
