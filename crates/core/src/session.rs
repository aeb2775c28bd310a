use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{QuizDefinition, QuizResult, SubmitTrigger};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question index {index} out of range ({count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },

    #[error("option index {index} out of range for question {question} ({count} options)")]
    OptionOutOfRange {
        question: usize,
        index: usize,
        count: usize,
    },

    #[error("attempt already submitted")]
    AlreadySubmitted,
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle state of an attempt. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    InProgress,
    Submitted,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One respondent's run through a quiz, from start to a scored result.
///
/// The session owns navigation, answer capture, the countdown, and scoring.
/// It holds no clock of its own: the host feeds it `tick()` once per second
/// while it is in progress, and passes `now` timestamps into the operations
/// that record time. A session is single-actor; hosts that share one across
/// tasks must serialize access themselves.
///
/// After submission every mutating operation fails with
/// `SessionError::AlreadySubmitted`, except `tick`, which becomes a no-op so
/// an external timer firing once more past expiry stays harmless.
pub struct QuizSession {
    definition: Arc<QuizDefinition>,
    current_question: usize,
    answers: BTreeMap<usize, usize>,
    remaining_seconds: Option<u32>,
    status: AttemptStatus,
    started_at: DateTime<Utc>,
    result: Option<QuizResult>,
}

impl QuizSession {
    /// Start a fresh attempt against the given definition.
    ///
    /// The definition is shared and immutable, so many sessions may run
    /// against the same `Arc`. `started_at` should come from the caller's
    /// clock to keep time deterministic.
    #[must_use]
    pub fn start(definition: Arc<QuizDefinition>, started_at: DateTime<Utc>) -> Self {
        let remaining_seconds = definition.time_limit_seconds();
        Self {
            definition,
            current_question: 0,
            answers: BTreeMap::new(),
            remaining_seconds,
            status: AttemptStatus::InProgress,
            started_at,
            result: None,
        }
    }

    // Accessors
    #[must_use]
    pub fn definition(&self) -> &QuizDefinition {
        &self.definition
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == AttemptStatus::Submitted
    }

    #[must_use]
    pub fn current_question(&self) -> usize {
        self.current_question
    }

    /// Recorded answers, keyed by question index.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: usize) -> Option<usize> {
        self.answers.get(&question).copied()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.definition.question_count()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Questions with no recorded answer. Submission is never blocked on
    /// this; callers that want a completeness warning check it themselves.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.question_count() - self.answered_count()
    }

    /// Seconds left on the countdown, or `None` for an untimed quiz.
    /// Frozen at its final value once the attempt is submitted.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.definition.is_timed()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The finished result, once the attempt has been submitted.
    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::Submitted => Err(SessionError::AlreadySubmitted),
        }
    }

    fn check_question_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.question_count() {
            Ok(())
        } else {
            Err(SessionError::QuestionOutOfRange {
                index,
                count: self.question_count(),
            })
        }
    }

    /// Record (or overwrite) the answer for a question. Last write wins,
    /// re-selecting the same option is a no-op, and the cursor stays put.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission, and the
    /// range errors for invalid indices; state is untouched on any error.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.check_question_index(question)?;

        let option_count = self.definition.questions()[question].option_count();
        if option >= option_count {
            return Err(SessionError::OptionOutOfRange {
                question,
                index: option,
                count: option_count,
            });
        }

        self.answers.insert(question, option);
        Ok(())
    }

    /// Jump to any question; revisiting and skipping ahead are both allowed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission and
    /// `SessionError::QuestionOutOfRange` for an invalid index.
    pub fn go_to_question(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.check_question_index(index)?;
        self.current_question = index;
        Ok(())
    }

    /// Move to the next question; already at the last one is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if self.current_question + 1 < self.question_count() {
            self.current_question += 1;
        }
        Ok(())
    }

    /// Move to the previous question; already at the first one is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.current_question = self.current_question.saturating_sub(1);
        Ok(())
    }

    /// Consume one second of the countdown. The tick that reaches zero
    /// auto-submits with whatever answers are recorded and returns the
    /// result; every other call (still running, untimed, or already
    /// submitted) returns `None`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<&QuizResult> {
        if self.is_submitted() {
            return None;
        }
        let remaining = self.remaining_seconds.as_mut()?;
        if *remaining == 0 {
            return None;
        }
        *remaining -= 1;
        if *remaining == 0 {
            return Some(self.finish(SubmitTrigger::TimerExpired, now));
        }
        None
    }

    /// Submit the attempt and return the scored result. Unanswered
    /// questions are allowed and count as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` if the attempt has already
    /// been submitted (explicitly or by the timer).
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<&QuizResult, SessionError> {
        self.ensure_in_progress()?;
        Ok(self.finish(SubmitTrigger::Manual, now))
    }

    /// Start a brand-new attempt over the same definition. The current
    /// session, submitted or not, is left untouched.
    #[must_use]
    pub fn restart(&self, started_at: DateTime<Utc>) -> QuizSession {
        QuizSession::start(Arc::clone(&self.definition), started_at)
    }

    // Shared terminal transition for explicit submit and timer expiry, so
    // both triggers produce identical scoring and result records.
    fn finish(&mut self, trigger: SubmitTrigger, now: DateTime<Utc>) -> &QuizResult {
        let total = self.question_count();
        let correct = self
            .definition
            .questions()
            .iter()
            .enumerate()
            .filter(|(index, question)| {
                self.answers
                    .get(index)
                    .is_some_and(|&option| question.is_correct(option))
            })
            .count();

        // total >= 1 is guaranteed by QuizDefinition validation, and the
        // rounded ratio cannot exceed 100.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        #[allow(clippy::cast_precision_loss)]
        let score = ((correct as f64 / total as f64) * 100.0).round() as u8;

        let time_spent_seconds = match self.definition.time_limit_seconds() {
            Some(limit) => limit.saturating_sub(self.remaining_seconds.unwrap_or(0)),
            None => u32::try_from((now - self.started_at).num_seconds().max(0))
                .unwrap_or(u32::MAX),
        };

        self.status = AttemptStatus::Submitted;
        &*self.result.insert(QuizResult::new(
            self.definition.id(),
            self.answers.clone(),
            score,
            time_spent_seconds,
            self.started_at,
            now,
            trigger,
        ))
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.definition.id())
            .field("status", &self.status)
            .field("current_question", &self.current_question)
            .field("answered", &self.answers.len())
            .field("remaining_seconds", &self.remaining_seconds)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
