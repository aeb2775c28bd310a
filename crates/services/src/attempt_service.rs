use std::sync::Arc;

use quiz_core::model::{AttemptReview, QuizId, QuizResult};
use quiz_core::session::QuizSession;
use storage::repository::{AttemptRepository, AttemptRow, QuizRepository};

use crate::Clock;
use crate::error::AttemptError;

/// A finished attempt together with the row id the result sink assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedAttempt {
    pub attempt_id: i64,
    pub result: QuizResult,
}

/// Orchestrates attempt start, submission, and result persistence.
///
/// The session engine itself never touches storage: this service loads the
/// definition before an attempt and hands the finished result to the
/// attempt repository after the engine has already transitioned, so a
/// persistence failure leaves the session validly submitted.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            attempts,
        }
    }

    /// Load the definition and open a fresh session against it.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::QuizNotFound` if the quiz does not exist and
    /// `AttemptError::Storage` for repository failures.
    pub async fn start_attempt(&self, quiz_id: QuizId) -> Result<QuizSession, AttemptError> {
        let definition = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(AttemptError::QuizNotFound(quiz_id))?;
        Ok(QuizSession::start(Arc::new(definition), self.clock.now()))
    }

    /// Submit the session and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Session` if the session was already submitted
    /// and `AttemptError::Storage` if persistence fails.
    pub async fn submit(
        &self,
        session: &mut QuizSession,
    ) -> Result<SubmittedAttempt, AttemptError> {
        let result = session.submit(self.clock.now())?.clone();
        let attempt_id = self.attempts.append_attempt(&result).await?;
        Ok(SubmittedAttempt { attempt_id, result })
    }

    /// Forward one countdown tick; when the tick expires the timer, the
    /// auto-submitted result is persisted and returned.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Storage` if persisting an expired attempt fails.
    pub async fn tick(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<SubmittedAttempt>, AttemptError> {
        let Some(result) = session.tick(self.clock.now()).cloned() else {
            return Ok(None);
        };
        let attempt_id = self.attempts.append_attempt(&result).await?;
        Ok(Some(SubmittedAttempt { attempt_id, result }))
    }

    /// List persisted attempts for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Storage` for repository failures.
    pub async fn list_attempts(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, AttemptError> {
        Ok(self.attempts.list_attempt_rows(quiz_id, limit).await?)
    }

    /// Rebuild the per-question review for a persisted attempt.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::QuizNotFound` if the definition has vanished,
    /// `AttemptError::Review` if the stored answers do not fit it, and
    /// `AttemptError::Storage` for repository failures.
    pub async fn review(&self, attempt_id: i64) -> Result<AttemptReview, AttemptError> {
        let result = self.attempts.get_attempt(attempt_id).await?;
        let definition = self
            .quizzes
            .get_quiz(result.quiz_id())
            .await?
            .ok_or(AttemptError::QuizNotFound(result.quiz_id()))?;
        Ok(AttemptReview::new(&definition, &result)?)
    }
}
