use std::collections::BTreeMap;

use quiz_core::model::{QuestionDraft, QuestionId, QuizId, QuizResult, SubmitTrigger};
use quiz_core::time::fixed_now;
use storage::repository::{AttemptRepository, NewQuizRecord, QuizRepository};
use storage::sqlite::SqliteRepository;

fn build_record(title: &str, time_limit_minutes: u32) -> NewQuizRecord {
    NewQuizRecord {
        title: title.to_owned(),
        description: Some("integration fixture".into()),
        time_limit_minutes,
        created_at: fixed_now(),
        questions: vec![
            QuestionDraft::new(
                "What does `?` do",
                vec!["propagates errors".into(), "panics".into()],
                0,
                Some("It returns early on Err.".into()),
            ),
            QuestionDraft::new(
                "Borrow checker enforces",
                vec!["aliasing xor mutation".into(), "GC".into(), "nothing".into()],
                0,
                None,
            ),
        ],
    }
}

#[tokio::test]
async fn sqlite_round_trips_quiz_definition() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let quiz_id = repo
        .insert_new_quiz(build_record("Rust Basics", 10))
        .await
        .unwrap();

    let quiz = repo.get_quiz(quiz_id).await.unwrap().expect("quiz stored");
    assert_eq!(quiz.title(), "Rust Basics");
    assert_eq!(quiz.description(), Some("integration fixture"));
    assert_eq!(quiz.time_limit_minutes(), 10);
    assert_eq!(quiz.question_count(), 2);
    assert_eq!(quiz.questions()[0].id(), QuestionId::new(1));
    assert_eq!(quiz.questions()[0].correct_option(), 0);
    assert_eq!(
        quiz.questions()[0].explanation(),
        Some("It returns early on Err.")
    );
    assert_eq!(quiz.questions()[1].option_count(), 3);

    assert!(repo.get_quiz(QuizId::new(999)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upsert_replaces_question_set() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_quiz_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let quiz_id = repo
        .insert_new_quiz(build_record("Before", 5))
        .await
        .unwrap();
    let mut record = build_record("After", 0);
    record.questions.truncate(1);
    let replacement = record.into_definition(quiz_id).unwrap();

    repo.upsert_quiz(&replacement).await.unwrap();

    let fetched = repo.get_quiz(quiz_id).await.unwrap().unwrap();
    assert_eq!(fetched.title(), "After");
    assert!(!fetched.is_timed());
    assert_eq!(fetched.question_count(), 1);
}

#[tokio::test]
async fn sqlite_round_trips_attempts_and_lists_newest_first() {
    let repo =
        SqliteRepository::connect("sqlite:file:memdb_attempts?mode=memory&cache=shared")
            .await
            .expect("connect");
    repo.migrate().await.expect("migrate");

    let quiz_id = repo
        .insert_new_quiz(build_record("Scored", 1))
        .await
        .unwrap();

    let mut answers = BTreeMap::new();
    answers.insert(0, 0);
    answers.insert(1, 2);
    let early = QuizResult::from_persisted(
        quiz_id,
        answers.clone(),
        50,
        30,
        fixed_now(),
        fixed_now(),
        SubmitTrigger::Manual,
    )
    .unwrap();
    let late = QuizResult::from_persisted(
        quiz_id,
        answers,
        100,
        60,
        fixed_now(),
        fixed_now() + chrono::Duration::seconds(60),
        SubmitTrigger::TimerExpired,
    )
    .unwrap();

    let early_id = repo.append_attempt(&early).await.unwrap();
    let late_id = repo.append_attempt(&late).await.unwrap();

    let fetched = repo.get_attempt(early_id).await.unwrap();
    assert_eq!(fetched.score(), 50);
    assert_eq!(fetched.answer_for(0), Some(0));
    assert_eq!(fetched.answer_for(1), Some(2));
    assert_eq!(fetched.trigger(), SubmitTrigger::Manual);

    let rows = repo.list_attempt_rows(quiz_id, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, late_id);
    assert_eq!(rows[0].result.trigger(), SubmitTrigger::TimerExpired);
    assert_eq!(rows[1].id, early_id);

    assert!(matches!(
        repo.get_attempt(12_345).await,
        Err(storage::repository::StorageError::NotFound)
    ));
}
