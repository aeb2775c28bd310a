use quiz_core::model::{QuestionDraft, QuestionOutcome, SubmitTrigger};
use quiz_core::time::fixed_clock;
use services::AppServices;
use storage::repository::Storage;

#[tokio::test]
async fn attempt_flow_persists_result_and_review() {
    let services = AppServices::new(Storage::in_memory(), fixed_clock());

    let quiz_id = services
        .quiz_service()
        .create_quiz(
            "Smoke Quiz".into(),
            Some("End-to-end attempt flow".into()),
            0,
            vec![
                QuestionDraft::new("Q1", vec!["a".into(), "b".into()], 1, None),
                QuestionDraft::new("Q2", vec!["a".into(), "b".into(), "c".into()], 0, None),
                QuestionDraft::new("Q3", vec!["a".into(), "b".into()], 0, None),
            ],
        )
        .await
        .unwrap();

    let attempts = services.attempt_service();
    let mut session = attempts.start_attempt(quiz_id).await.unwrap();

    session.select_answer(0, 1).unwrap();
    session.next().unwrap();
    session.select_answer(1, 2).unwrap();
    // Q3 left unanswered on purpose.

    let submitted = attempts.submit(&mut session).await.unwrap();
    assert_eq!(submitted.result.score(), 33);
    assert_eq!(submitted.result.trigger(), SubmitTrigger::Manual);

    let review = attempts.review(submitted.attempt_id).await.unwrap();
    assert_eq!(review.quiz_id(), quiz_id);
    assert_eq!(review.correct_count(), 1);
    assert_eq!(review.unanswered_count(), 1);
    assert_eq!(
        review.items()[0].outcome,
        QuestionOutcome::Correct { selected: 1 }
    );
    assert_eq!(
        review.items()[1].outcome,
        QuestionOutcome::Incorrect { selected: 2 }
    );
    assert_eq!(review.items()[2].outcome, QuestionOutcome::Unanswered);
}

#[tokio::test(start_paused = true)]
async fn timed_attempt_expires_through_the_ticker() {
    let services = AppServices::new(Storage::in_memory(), fixed_clock());

    let quiz_id = services
        .quiz_service()
        .create_quiz(
            "Timed Smoke Quiz".into(),
            None,
            1,
            vec![
                QuestionDraft::new("Q1", vec!["a".into(), "b".into()], 0, None),
                QuestionDraft::new("Q2", vec!["a".into(), "b".into()], 1, None),
            ],
        )
        .await
        .unwrap();

    let attempts = services.attempt_service();
    let session = attempts.start_attempt(quiz_id).await.unwrap();
    let session = std::sync::Arc::new(tokio::sync::Mutex::new(session));
    session.lock().await.select_answer(0, 0).unwrap();

    let handle = services.attempt_ticker().spawn(std::sync::Arc::clone(&session));
    let submitted = handle.await.unwrap().unwrap().expect("timer expired");

    assert_eq!(submitted.result.trigger(), SubmitTrigger::TimerExpired);
    assert_eq!(submitted.result.score(), 50);
    assert_eq!(submitted.result.time_spent_seconds(), 60);
    assert!(session.lock().await.is_submitted());

    let review = attempts.review(submitted.attempt_id).await.unwrap();
    assert_eq!(review.unanswered_count(), 1);
}
