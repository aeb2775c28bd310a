use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::quiz::QuizDefinition;
use crate::model::result::QuizResult;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("result belongs to quiz {result}, not quiz {definition}")]
    QuizMismatch { definition: QuizId, result: QuizId },

    #[error("recorded answer targets question {index}, but the quiz has {count} questions")]
    AnswerOutOfRange { index: usize, count: usize },
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// How a single question ended up. `Unanswered` is kept distinct from
/// `Incorrect` so review surfaces can render them differently, even though
/// both earn no credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOutcome {
    Correct { selected: usize },
    Incorrect { selected: usize },
    Unanswered,
}

impl QuestionOutcome {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, QuestionOutcome::Correct { .. })
    }

    /// The selected option index, if the question was answered.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self {
            QuestionOutcome::Correct { selected } | QuestionOutcome::Incorrect { selected } => {
                Some(*selected)
            }
            QuestionOutcome::Unanswered => None,
        }
    }
}

//
// ─── REVIEW ────────────────────────────────────────────────────────────────────
//

/// One question's row in an attempt review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub index: usize,
    pub question_id: QuestionId,
    pub correct_option: usize,
    pub outcome: QuestionOutcome,
}

/// Per-question review of a finished attempt, rebuilt from the immutable
/// definition plus the persisted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReview {
    quiz_id: QuizId,
    score: u8,
    items: Vec<QuestionReview>,
}

impl AttemptReview {
    /// Build the review for `result` against its `definition`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::QuizMismatch` if the result was recorded against
    /// a different quiz, and `ReviewError::AnswerOutOfRange` if a persisted
    /// answer indexes past the question set.
    pub fn new(definition: &QuizDefinition, result: &QuizResult) -> Result<Self, ReviewError> {
        if definition.id() != result.quiz_id() {
            return Err(ReviewError::QuizMismatch {
                definition: definition.id(),
                result: result.quiz_id(),
            });
        }

        if let Some((&index, _)) = result.answers().last_key_value() {
            if index >= definition.question_count() {
                return Err(ReviewError::AnswerOutOfRange {
                    index,
                    count: definition.question_count(),
                });
            }
        }

        let items = definition
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let outcome = match result.answer_for(index) {
                    Some(selected) if question.is_correct(selected) => {
                        QuestionOutcome::Correct { selected }
                    }
                    Some(selected) => QuestionOutcome::Incorrect { selected },
                    None => QuestionOutcome::Unanswered,
                };
                QuestionReview {
                    index,
                    question_id: question.id(),
                    correct_option: question.correct_option(),
                    outcome,
                }
            })
            .collect();

        Ok(Self {
            quiz_id: definition.id(),
            score: result.score(),
            items,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn items(&self) -> &[QuestionReview] {
        &self.items
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome.is_correct())
            .count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome == QuestionOutcome::Unanswered)
            .count()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Question, SubmitTrigger};
    use crate::time::fixed_now;
    use std::collections::BTreeMap;

    fn build_definition() -> QuizDefinition {
        let questions = vec![
            Question::new(
                QuestionId::new(1),
                "Q1",
                vec!["a".into(), "b".into()],
                1,
                None,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                "Q2",
                vec!["a".into(), "b".into(), "c".into()],
                0,
                None,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(3),
                "Q3",
                vec!["a".into(), "b".into(), "c".into()],
                2,
                None,
            )
            .unwrap(),
        ];
        QuizDefinition::new(QuizId::new(7), "Review", None, 0, questions, fixed_now()).unwrap()
    }

    fn build_result(quiz_id: QuizId, answers: BTreeMap<usize, usize>) -> QuizResult {
        QuizResult::from_persisted(
            quiz_id,
            answers,
            33,
            12,
            fixed_now(),
            fixed_now(),
            SubmitTrigger::Manual,
        )
        .unwrap()
    }

    #[test]
    fn review_distinguishes_unanswered_from_incorrect() {
        let definition = build_definition();
        let mut answers = BTreeMap::new();
        answers.insert(0, 1); // correct
        answers.insert(1, 2); // incorrect
        // question 2 unanswered
        let result = build_result(definition.id(), answers);

        let review = AttemptReview::new(&definition, &result).unwrap();
        assert_eq!(review.items().len(), 3);
        assert_eq!(
            review.items()[0].outcome,
            QuestionOutcome::Correct { selected: 1 }
        );
        assert_eq!(
            review.items()[1].outcome,
            QuestionOutcome::Incorrect { selected: 2 }
        );
        assert_eq!(review.items()[2].outcome, QuestionOutcome::Unanswered);
        assert_eq!(review.correct_count(), 1);
        assert_eq!(review.unanswered_count(), 1);
    }

    #[test]
    fn review_rejects_result_for_other_quiz() {
        let definition = build_definition();
        let result = build_result(QuizId::new(99), BTreeMap::new());
        let err = AttemptReview::new(&definition, &result).unwrap_err();
        assert_eq!(
            err,
            ReviewError::QuizMismatch {
                definition: QuizId::new(7),
                result: QuizId::new(99),
            }
        );
    }

    #[test]
    fn review_rejects_answer_past_question_set() {
        let definition = build_definition();
        let mut answers = BTreeMap::new();
        answers.insert(5, 0);
        let result = build_result(definition.id(), answers);
        let err = AttemptReview::new(&definition, &result).unwrap_err();
        assert_eq!(err, ReviewError::AnswerOutOfRange { index: 5, count: 3 });
    }
}
