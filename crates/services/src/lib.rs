#![forbid(unsafe_code)]

pub mod app_services;
pub mod attempt_service;
pub mod error;
pub mod generator;
pub mod quiz_service;
pub mod ticker;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use attempt_service::{AttemptService, SubmittedAttempt};
pub use error::{AppServicesError, AttemptError, GeneratorError, QuizServiceError};
pub use generator::{GeneratorConfig, QuizGeneratorService};
pub use quiz_service::QuizService;
pub use ticker::AttemptTicker;
