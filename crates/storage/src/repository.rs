use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{QuestionDraft, QuestionId, QuizDefinition, QuizId, QuizResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Input shape for creating a quiz; storage assigns the quiz id and
/// question ids, so the questions arrive as drafts.
#[derive(Debug, Clone)]
pub struct NewQuizRecord {
    pub title: String,
    pub description: Option<String>,
    pub time_limit_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionDraft>,
}

impl NewQuizRecord {
    #[must_use]
    pub fn from_definition(definition: &QuizDefinition) -> Self {
        Self {
            title: definition.title().to_owned(),
            description: definition.description().map(str::to_owned),
            time_limit_minutes: definition.time_limit_minutes(),
            created_at: definition.created_at(),
            questions: definition
                .questions()
                .iter()
                .map(|q| {
                    QuestionDraft::new(
                        q.prompt(),
                        q.options().to_vec(),
                        q.correct_option(),
                        q.explanation().map(str::to_owned),
                    )
                })
                .collect(),
        }
    }

    /// Build the validated definition this record describes, under the id
    /// the store assigned. Question ids are positional, starting at 1.
    ///
    /// # Errors
    ///
    /// Returns the core validation error if a draft or the quiz shape is
    /// invalid.
    pub fn into_definition(self, id: QuizId) -> Result<QuizDefinition, quiz_core::Error> {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, draft)| draft.validate(QuestionId::new(index as u64 + 1)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QuizDefinition::new(
            id,
            self.title,
            self.description,
            self.time_limit_minutes,
            questions,
            self.created_at,
        )?)
    }
}

/// Repository contract for quiz definitions (the definition source).
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a new quiz; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// Persist or replace a quiz under its existing id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError>;

    /// Fetch a quiz by id. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<QuizDefinition>, StorageError>;

    /// List quizzes ordered by id, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizDefinition>, StorageError>;
}

/// A persisted attempt with its storage-assigned row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: i64,
    pub result: QuizResult,
}

/// Repository contract for finished attempts (the result sink).
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a finished attempt and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, result: &QuizResult) -> Result<i64, StorageError>;

    /// Fetch a finished attempt by row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: i64) -> Result<QuizResult, StorageError>;

    /// List attempts for a quiz, newest first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_attempt_rows(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, QuizDefinition>>>,
    attempts: Arc<Mutex<Vec<QuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            quizzes: Arc::new(Mutex::new(HashMap::new())),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.keys().map(|id| id.value()).max().unwrap_or(0) + 1;
        let id = QuizId::new(next);
        let definition = quiz
            .into_definition(id)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.insert(id, definition);
        Ok(id)
    }

    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<QuizDefinition>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizDefinition>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut quizzes: Vec<_> = guard.values().cloned().collect();
        quizzes.sort_by_key(QuizDefinition::id);
        quizzes.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(quizzes)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(result.clone());
        i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))
    }

    async fn get_attempt(&self, id: i64) -> Result<QuizResult, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let index = id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_attempt_rows(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let rows = guard
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, result)| result.quiz_id() == quiz_id)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(index, result)| AttemptRow {
                id: index as i64 + 1,
                result: result.clone(),
            })
            .collect();
        Ok(rows)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { quizzes, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SubmitTrigger;
    use quiz_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn build_record(title: &str) -> NewQuizRecord {
        NewQuizRecord {
            title: title.to_owned(),
            description: None,
            time_limit_minutes: 5,
            created_at: fixed_now(),
            questions: vec![
                QuestionDraft::new("Q1", vec!["a".into(), "b".into()], 0, None),
                QuestionDraft::new("Q2", vec!["a".into(), "b".into(), "c".into()], 2, None),
            ],
        }
    }

    fn build_result(quiz_id: QuizId, score: u8) -> QuizResult {
        let mut answers = BTreeMap::new();
        answers.insert(0, 0);
        QuizResult::from_persisted(
            quiz_id,
            answers,
            score,
            17,
            fixed_now(),
            fixed_now(),
            SubmitTrigger::Manual,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_round_trips() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_new_quiz(build_record("Basics")).await.unwrap();

        let quiz = repo.get_quiz(id).await.unwrap().expect("quiz stored");
        assert_eq!(quiz.title(), "Basics");
        assert_eq!(quiz.question_count(), 2);
        assert_eq!(quiz.questions()[0].id(), QuestionId::new(1));
        assert_eq!(quiz.questions()[1].id(), QuestionId::new(2));
    }

    #[tokio::test]
    async fn missing_quiz_is_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_quiz(QuizId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn attempts_list_newest_first_per_quiz() {
        let repo = InMemoryRepository::new();
        let quiz_id = repo.insert_new_quiz(build_record("Scoped")).await.unwrap();
        let other = QuizId::new(999);

        let first = repo.append_attempt(&build_result(quiz_id, 50)).await.unwrap();
        repo.append_attempt(&build_result(other, 10)).await.unwrap();
        let second = repo.append_attempt(&build_result(quiz_id, 75)).await.unwrap();

        let rows = repo.list_attempt_rows(quiz_id, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].result.score(), 75);
        assert_eq!(rows[1].id, first);

        let fetched = repo.get_attempt(first).await.unwrap();
        assert_eq!(fetched.score(), 50);
    }

    #[tokio::test]
    async fn non_positive_attempt_ids_are_not_found() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(&build_result(QuizId::new(1), 50))
            .await
            .unwrap();

        for id in [0, -1, i64::MIN] {
            assert!(matches!(
                repo.get_attempt(id).await,
                Err(StorageError::NotFound)
            ));
        }
    }
}
