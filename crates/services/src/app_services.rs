use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::attempt_service::AttemptService;
use crate::error::AppServicesError;
use crate::generator::QuizGeneratorService;
use crate::quiz_service::QuizService;
use crate::ticker::AttemptTicker;

/// Assembles app-facing services over a shared storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_service: Arc<QuizService>,
    attempt_service: Arc<AttemptService>,
    generator: Arc<QuizGeneratorService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, clock))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn new_in_memory(clock: Clock) -> Self {
        Self::new(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn new(storage: Storage, clock: Clock) -> Self {
        let quiz_service = Arc::new(QuizService::new(clock, Arc::clone(&storage.quizzes)));
        let attempt_service = Arc::new(AttemptService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.attempts),
        ));
        let generator = Arc::new(QuizGeneratorService::from_env());
        Self {
            quiz_service,
            attempt_service,
            generator,
        }
    }

    #[must_use]
    pub fn quiz_service(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz_service)
    }

    #[must_use]
    pub fn attempt_service(&self) -> Arc<AttemptService> {
        Arc::clone(&self.attempt_service)
    }

    /// A ticker wired to the attempt service, for driving timed sessions.
    #[must_use]
    pub fn attempt_ticker(&self) -> AttemptTicker {
        AttemptTicker::new(self.attempt_service.as_ref().clone())
    }

    #[must_use]
    pub fn generator(&self) -> Arc<QuizGeneratorService> {
        Arc::clone(&self.generator)
    }
}
