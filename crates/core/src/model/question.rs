use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs at least 2 options, got {len}")]
    NotEnoughOptions { len: usize },

    #[error("option {index} cannot be empty")]
    EmptyOption { index: usize },

    #[error("correct option {index} out of range ({len} options)")]
    CorrectOptionOutOfRange { index: usize, len: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question input, as produced by an author form or the
/// generator service. `validate` turns it into a `Question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        explanation: Option<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            correct_option,
            explanation,
        }
    }

    /// Validate the draft into a `Question` with the given id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is empty, fewer
    /// than two options are given, or `correct_option` is out of range.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        Question::new(
            id,
            self.prompt,
            self.options,
            self.correct_option,
            self.explanation,
        )
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question: a prompt, an ordered set of options,
/// the index of the correct option, and an optional review explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: Option<String>,
}

impl Question {
    /// Creates a new validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` if the prompt is whitespace-only,
    /// `QuestionError::NotEnoughOptions` if fewer than two options are given,
    /// `QuestionError::EmptyOption` if any option is whitespace-only, and
    /// `QuestionError::CorrectOptionOutOfRange` if `correct_option` does not
    /// index into the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        if options.len() < 2 {
            return Err(QuestionError::NotEnoughOptions { len: options.len() });
        }

        let mut trimmed = Vec::with_capacity(options.len());
        for (index, option) in options.into_iter().enumerate() {
            let option = option.trim().to_owned();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            trimmed.push(option);
        }

        if correct_option >= trimmed.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                index: correct_option,
                len: trimmed.len(),
            });
        }

        let explanation = explanation
            .map(|e| e.trim().to_owned())
            .filter(|e| !e.is_empty());

        Ok(Self {
            id,
            prompt: prompt.trim().to_owned(),
            options: trimmed,
            correct_option,
            explanation,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    /// Whether the given option index is the correct answer.
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn question_new_happy_path() {
        let question = Question::new(
            QuestionId::new(1),
            "What is 2 + 2?",
            options(&["3", "4", "5"]),
            1,
            Some("Basic arithmetic.".into()),
        )
        .unwrap();

        assert_eq!(question.id(), QuestionId::new(1));
        assert_eq!(question.prompt(), "What is 2 + 2?");
        assert_eq!(question.option_count(), 3);
        assert_eq!(question.correct_option(), 1);
        assert!(question.is_correct(1));
        assert!(!question.is_correct(0));
        assert_eq!(question.explanation(), Some("Basic arithmetic."));
    }

    #[test]
    fn question_rejects_empty_prompt() {
        let err = Question::new(QuestionId::new(1), "   ", options(&["a", "b"]), 0, None)
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt);
    }

    #[test]
    fn question_rejects_single_option() {
        let err =
            Question::new(QuestionId::new(1), "Q", options(&["only"]), 0, None).unwrap_err();
        assert_eq!(err, QuestionError::NotEnoughOptions { len: 1 });
    }

    #[test]
    fn question_rejects_blank_option() {
        let err =
            Question::new(QuestionId::new(1), "Q", options(&["a", "  "]), 0, None).unwrap_err();
        assert_eq!(err, QuestionError::EmptyOption { index: 1 });
    }

    #[test]
    fn question_rejects_out_of_range_correct_option() {
        let err =
            Question::new(QuestionId::new(1), "Q", options(&["a", "b"]), 2, None).unwrap_err();
        assert_eq!(err, QuestionError::CorrectOptionOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn question_trims_and_filters_empty_explanation() {
        let question = Question::new(
            QuestionId::new(1),
            "  Q  ",
            options(&[" a ", "b"]),
            0,
            Some("   ".into()),
        )
        .unwrap();

        assert_eq!(question.prompt(), "Q");
        assert_eq!(question.options()[0], "a");
        assert_eq!(question.explanation(), None);
    }

    #[test]
    fn draft_validates_into_question() {
        let draft = QuestionDraft::new("Q", options(&["a", "b"]), 1, None);
        let question = draft.validate(QuestionId::new(9)).unwrap();
        assert_eq!(question.id(), QuestionId::new(9));
        assert_eq!(question.correct_option(), 1);
    }
}
