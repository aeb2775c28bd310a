//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, QuizId, ReviewError};
use quiz_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizGeneratorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("question generation is not configured")]
    Disabled,
    #[error("generator returned an empty response")]
    EmptyResponse,
    #[error("generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("generator returned malformed questions: {0}")]
    Malformed(String),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] quiz_core::model::QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AttemptService` and `AttemptTicker`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
