use quiz_core::model::{QuizDefinition, QuizId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    id_i64, map_question_row, options_to_json, quiz_id_from_i64, ser, u32_from_i64,
};
use crate::repository::{NewQuizRecord, QuizRepository, StorageError};

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (title, description, time_limit_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(i64::from(quiz.time_limit_minutes))
        .bind(quiz.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let quiz_id = quiz_id_from_i64(res.last_insert_rowid())?;

        // Validate through the domain constructors before anything hits the
        // questions table, so a malformed draft rolls the whole insert back.
        let definition = quiz
            .into_definition(quiz_id)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        insert_questions(&mut tx, &definition).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(quiz_id)
    }

    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError> {
        let quiz_id = id_i64("quiz_id", quiz.id().value())?;
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, description, time_limit_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                time_limit_minutes = excluded.time_limit_minutes
            ",
        )
        .bind(quiz_id)
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(i64::from(quiz.time_limit_minutes()))
        .bind(quiz.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Question sets are replaced wholesale; the definition is immutable
        // from the engine's point of view, so partial edits are not a case.
        sqlx::query("DELETE FROM questions WHERE quiz_id = ?1")
            .bind(quiz_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        insert_questions(&mut tx, quiz).await?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<QuizDefinition>, StorageError> {
        let quiz_id = id_i64("quiz_id", id.value())?;
        let row = sqlx::query(
            r"
            SELECT id, title, description, time_limit_minutes, created_at
            FROM quizzes WHERE id = ?1
            ",
        )
        .bind(quiz_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
            SELECT id, prompt, options, correct_option, explanation
            FROM questions
            WHERE quiz_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(quiz_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for question_row in &question_rows {
            questions.push(map_question_row(question_row)?);
        }

        quiz_from_row(&row, questions).map(Some)
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizDefinition>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id FROM quizzes ORDER BY id ASC LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in rows {
            let id = quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
            match self.get_quiz(id).await? {
                Some(quiz) => quizzes.push(quiz),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(quizzes)
    }
}

async fn insert_questions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    quiz: &QuizDefinition,
) -> Result<(), StorageError> {
    let quiz_id = id_i64("quiz_id", quiz.id().value())?;
    for (position, question) in quiz.questions().iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO questions (id, quiz_id, position, prompt, options, correct_option, explanation)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(quiz_id)
        .bind(i64::try_from(position).map_err(|_| StorageError::Serialization("position overflow".into()))?)
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(i64::try_from(question.correct_option()).map_err(|_| StorageError::Serialization("correct_option overflow".into()))?)
        .bind(question.explanation())
        .execute(&mut **tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    }
    Ok(())
}

fn quiz_from_row(
    row: &SqliteRow,
    questions: Vec<quiz_core::model::Question>,
) -> Result<QuizDefinition, StorageError> {
    QuizDefinition::new(
        quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        u32_from_i64(
            "time_limit_minutes",
            row.try_get::<i64, _>("time_limit_minutes").map_err(ser)?,
        )?,
        questions,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
