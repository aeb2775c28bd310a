use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must have at least one question")]
    NoQuestions,

    #[error("duplicate question id {id} in quiz")]
    DuplicateQuestionId { id: QuestionId },
}

//
// ─── QUIZ DEFINITION ───────────────────────────────────────────────────────────
//

/// The immutable definition of a quiz: an ordered question set plus timing
/// rules. Sessions read it and never mutate it, so one definition can back
/// many concurrent attempts.
///
/// A `time_limit_minutes` of `0` means the quiz is untimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    description: Option<String>,
    time_limit_minutes: u32,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
}

impl QuizDefinition {
    /// Creates a new validated quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is whitespace-only,
    /// `QuizError::NoQuestions` if the question set is empty, and
    /// `QuizError::DuplicateQuestionId` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        description: Option<String>,
        time_limit_minutes: u32,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }

        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestionId { id: question.id() });
            }
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            time_limit_minutes,
            questions,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    /// Whether attempts against this quiz run against a countdown.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_limit_minutes > 0
    }

    /// The time limit in seconds, or `None` when untimed. Saturates at
    /// `u32::MAX` since the constructor puts no cap on the minutes.
    #[must_use]
    pub fn time_limit_seconds(&self) -> Option<u32> {
        if self.is_timed() {
            Some(self.time_limit_minutes.saturating_mul(60))
        } else {
            None
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            vec!["a".into(), "b".into()],
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn quiz_new_happy_path() {
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            "Rust Basics",
            Some("ownership + borrowing".into()),
            10,
            vec![build_question(1), build_question(2)],
            fixed_now(),
        )
        .unwrap();

        assert_eq!(quiz.id(), QuizId::new(1));
        assert_eq!(quiz.title(), "Rust Basics");
        assert_eq!(quiz.description(), Some("ownership + borrowing"));
        assert_eq!(quiz.question_count(), 2);
        assert!(quiz.is_timed());
        assert_eq!(quiz.time_limit_seconds(), Some(600));
    }

    #[test]
    fn quiz_rejects_empty_title() {
        let err = QuizDefinition::new(
            QuizId::new(1),
            "   ",
            None,
            0,
            vec![build_question(1)],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, QuizError::EmptyTitle);
    }

    #[test]
    fn quiz_rejects_empty_question_set() {
        let err =
            QuizDefinition::new(QuizId::new(1), "Empty", None, 0, Vec::new(), fixed_now())
                .unwrap_err();
        assert_eq!(err, QuizError::NoQuestions);
    }

    #[test]
    fn quiz_rejects_duplicate_question_ids() {
        let err = QuizDefinition::new(
            QuizId::new(1),
            "Dup",
            None,
            0,
            vec![build_question(1), build_question(1)],
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuizError::DuplicateQuestionId {
                id: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn zero_time_limit_means_untimed() {
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            "Untimed",
            None,
            0,
            vec![build_question(1)],
            fixed_now(),
        )
        .unwrap();

        assert!(!quiz.is_timed());
        assert_eq!(quiz.time_limit_seconds(), None);
    }

    #[test]
    fn huge_time_limit_saturates_in_seconds() {
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            "Marathon",
            None,
            u32::MAX,
            vec![build_question(1)],
            fixed_now(),
        )
        .unwrap();

        assert_eq!(quiz.time_limit_seconds(), Some(u32::MAX));
    }

    #[test]
    fn quiz_trims_title_and_filters_empty_description() {
        let quiz = QuizDefinition::new(
            QuizId::new(1),
            "  Networking  ",
            Some("   ".into()),
            5,
            vec![build_question(1)],
            fixed_now(),
        )
        .unwrap();

        assert_eq!(quiz.title(), "Networking");
        assert_eq!(quiz.description(), None);
    }
}
