use quiz_core::model::{Question, QuestionId, QuizId, SubmitTrigger};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    Ok(QuizId::new(i64_to_u64("quiz_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Converts a `SubmitTrigger` to its storage representation.
/// Storage encoding: Manual=0, TimerExpired=1.
pub(crate) fn trigger_to_i64(trigger: SubmitTrigger) -> i64 {
    match trigger {
        SubmitTrigger::Manual => 0,
        SubmitTrigger::TimerExpired => 1,
    }
}

/// Converts a stored integer back into `SubmitTrigger`.
/// This must stay consistent with `trigger_to_i64`.
pub(crate) fn trigger_from_i64(value: i64) -> Result<SubmitTrigger, StorageError> {
    match value {
        0 => Ok(SubmitTrigger::Manual),
        1 => Ok(SubmitTrigger::TimerExpired),
        other => Err(StorageError::Serialization(format!(
            "invalid submit_trigger: {other}"
        ))),
    }
}

pub(crate) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

pub(crate) fn options_from_json(raw: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let options = options_from_json(&row.try_get::<String, _>("options").map_err(ser)?)?;
    let correct_option = usize_from_i64(
        "correct_option",
        row.try_get::<i64, _>("correct_option").map_err(ser)?,
    )?;
    let explanation: Option<String> = row.try_get("explanation").map_err(ser)?;

    Question::new(id, prompt, options, correct_option, explanation).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_encoding_round_trips() {
        for trigger in [SubmitTrigger::Manual, SubmitTrigger::TimerExpired] {
            assert_eq!(trigger_from_i64(trigger_to_i64(trigger)).unwrap(), trigger);
        }
        assert!(trigger_from_i64(2).is_err());
    }

    #[test]
    fn options_json_round_trips() {
        let options = vec!["a".to_owned(), "b\"quoted\"".to_owned()];
        let json = options_to_json(&options).unwrap();
        assert_eq!(options_from_json(&json).unwrap(), options);
    }
}
