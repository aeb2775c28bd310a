use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::model::ids::QuizId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score {score} out of range (0..=100)")]
    ScoreOutOfRange { score: u8 },

    #[error("submitted_at is before started_at")]
    InvalidTimeRange,
}

//
// ─── SUBMIT TRIGGER ────────────────────────────────────────────────────────────
//

/// What caused an attempt to finish: the respondent submitting, or the
/// countdown reaching zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimerExpired,
}

impl fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitTrigger::Manual => write!(f, "manual"),
            SubmitTrigger::TimerExpired => write!(f, "timer expired"),
        }
    }
}

//
// ─── QUIZ RESULT ───────────────────────────────────────────────────────────────
//

/// The finished, scored record of one quiz attempt. This is the whole
/// contract with whatever persists or transmits results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    quiz_id: QuizId,
    answers: BTreeMap<usize, usize>,
    score: u8,
    time_spent_seconds: u32,
    started_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    trigger: SubmitTrigger,
}

impl QuizResult {
    /// Built by the session engine, which guarantees the invariants hold.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quiz_id: QuizId,
        answers: BTreeMap<usize, usize>,
        score: u8,
        time_spent_seconds: u32,
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        trigger: SubmitTrigger,
    ) -> Self {
        Self {
            quiz_id,
            answers,
            score,
            time_spent_seconds,
            started_at,
            submitted_at,
            trigger,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::ScoreOutOfRange` if the score exceeds 100 and
    /// `ResultError::InvalidTimeRange` if the timestamps are out of order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        quiz_id: QuizId,
        answers: BTreeMap<usize, usize>,
        score: u8,
        time_spent_seconds: u32,
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        trigger: SubmitTrigger,
    ) -> Result<Self, ResultError> {
        if score > 100 {
            return Err(ResultError::ScoreOutOfRange { score });
        }
        if submitted_at < started_at {
            return Err(ResultError::InvalidTimeRange);
        }

        Ok(Self::new(
            quiz_id,
            answers,
            score,
            time_spent_seconds,
            started_at,
            submitted_at,
            trigger,
        ))
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    /// Recorded answers, keyed by question index.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    /// The option the respondent selected for a question, if any.
    #[must_use]
    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    /// Percentage score, integer-rounded, always in `0..=100`.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    #[must_use]
    pub fn trigger(&self) -> SubmitTrigger {
        self.trigger
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn from_persisted_accepts_valid_record() {
        let mut answers = BTreeMap::new();
        answers.insert(0, 1);

        let result = QuizResult::from_persisted(
            QuizId::new(1),
            answers,
            50,
            30,
            fixed_now(),
            fixed_now() + Duration::seconds(30),
            SubmitTrigger::Manual,
        )
        .unwrap();

        assert_eq!(result.score(), 50);
        assert_eq!(result.answer_for(0), Some(1));
        assert_eq!(result.answer_for(1), None);
        assert_eq!(result.trigger(), SubmitTrigger::Manual);
    }

    #[test]
    fn from_persisted_rejects_score_over_100() {
        let err = QuizResult::from_persisted(
            QuizId::new(1),
            BTreeMap::new(),
            101,
            0,
            fixed_now(),
            fixed_now(),
            SubmitTrigger::Manual,
        )
        .unwrap_err();
        assert_eq!(err, ResultError::ScoreOutOfRange { score: 101 });
    }

    #[test]
    fn from_persisted_rejects_inverted_time_range() {
        let err = QuizResult::from_persisted(
            QuizId::new(1),
            BTreeMap::new(),
            0,
            0,
            fixed_now(),
            fixed_now() - Duration::seconds(1),
            SubmitTrigger::TimerExpired,
        )
        .unwrap_err();
        assert_eq!(err, ResultError::InvalidTimeRange);
    }
}
