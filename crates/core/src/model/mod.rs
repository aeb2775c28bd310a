mod ids;
mod question;
mod quiz;
mod result;
mod review;

pub use ids::{ParseIdError, QuestionId, QuizId};
pub use question::{Question, QuestionDraft, QuestionError};
pub use quiz::{QuizDefinition, QuizError};
pub use result::{QuizResult, ResultError, SubmitTrigger};
pub use review::{AttemptReview, QuestionOutcome, QuestionReview, ReviewError};
