use thiserror::Error;

use crate::model::{QuestionError, QuizError, ResultError, ReviewError};
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
