use std::sync::Arc;

use quiz_core::model::{QuestionDraft, QuestionId, QuizDefinition, QuizId};
use storage::repository::{NewQuizRecord, QuizRepository};

use crate::Clock;
use crate::error::QuizServiceError;

/// Orchestrates quiz creation and persistence.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { clock, quizzes }
    }

    /// Validate question drafts into a quiz and persist it.
    ///
    /// The store assigns the real id; validation runs against a placeholder
    /// first so a malformed quiz never reaches storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz`/`Question` for validation failures.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(
        &self,
        title: String,
        description: Option<String>,
        time_limit_minutes: u32,
        questions: Vec<QuestionDraft>,
    ) -> Result<QuizId, QuizServiceError> {
        let now = self.clock.now();
        let validated = questions
            .into_iter()
            .enumerate()
            .map(|(index, draft)| draft.validate(QuestionId::new(index as u64 + 1)))
            .collect::<Result<Vec<_>, _>>()?;
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            title,
            description,
            time_limit_minutes,
            validated,
            now,
        )?;
        let quiz_id = self
            .quizzes
            .insert_new_quiz(NewQuizRecord::from_definition(&quiz))
            .await?;
        Ok(quiz_id)
    }

    /// Fetch a quiz by id.
    ///
    /// Returns `Ok(None)` when the quiz does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<QuizDefinition>, QuizServiceError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        Ok(quiz)
    }

    /// List quizzes ordered by id, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<QuizDefinition>, QuizServiceError> {
        let quizzes = self.quizzes.list_quizzes(limit).await?;
        Ok(quizzes)
    }
}
