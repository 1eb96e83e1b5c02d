mod common;

use std::collections::HashMap;

use quizmaster_server::{
    errors::AppError,
    models::{
        domain::{AnswerKey, Question, QuestionType, User},
        dto::request::{SubmitQuizRequest, SubmittedResponse},
    },
};

use common::{seed_quiz, test_app, TestApp};

fn question(question_type: QuestionType, key: &[i64]) -> Question {
    Question::new(
        "pending",
        "Pick the right option(s)",
        ["alpha".into(), "beta".into(), "gamma".into(), "delta".into()],
        question_type,
        AnswerKey::from_indices(key.iter().copied()).unwrap(),
        1,
        0,
    )
    .unwrap()
}

/// Three single-choice questions keyed 2, 4, 1 and one multiple-choice keyed {1,3}.
fn four_questions() -> Vec<Question> {
    vec![
        question(QuestionType::Single, &[2]),
        question(QuestionType::Single, &[4]),
        question(QuestionType::Single, &[1]),
        question(QuestionType::Multiple, &[1, 3]),
    ]
}

fn request(ids: &[String], responses: Vec<SubmittedResponse>) -> SubmitQuizRequest {
    SubmitQuizRequest {
        answers: ids
            .iter()
            .cloned()
            .zip(responses.into_iter().map(Some))
            .collect(),
        start_time: None,
    }
}

async fn learner(app: &TestApp) -> User {
    let user = User::new("learner@example.com", "Learner", None, None, "hash".into());
    app.db.users.write().await.push(user.clone());
    user
}

async fn question_ids(app: &TestApp) -> Vec<String> {
    app.db.questions.read().await.iter().map(|q| q.id.clone()).collect()
}

#[tokio::test]
async fn perfect_then_partial_retake() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let ids = question_ids(&app).await;
    let service = &app.state.quiz_attempt_service;

    let first = service
        .submit(
            &user.id,
            &quiz.id,
            request(
                &ids,
                vec![
                    SubmittedResponse::Index(2),
                    SubmittedResponse::Index(4),
                    SubmittedResponse::Text("1".into()),
                    SubmittedResponse::Indices(vec![3, 1]),
                ],
            ),
        )
        .await
        .unwrap();
    assert_eq!(first.attempt.total_scored, 4);
    assert_eq!(first.attempt.total_questions, 4);
    assert_eq!(first.attempt.percentage, 100.0);
    assert_eq!(first.attempt.performance, "Excellent");

    let second = service
        .submit(
            &user.id,
            &quiz.id,
            request(
                &ids,
                vec![
                    SubmittedResponse::Index(2),
                    SubmittedResponse::Index(3),
                    SubmittedResponse::Index(1),
                    SubmittedResponse::Indices(vec![1]),
                ],
            ),
        )
        .await
        .unwrap();
    assert_eq!(second.attempt.total_scored, 2);
    assert_eq!(second.attempt.percentage, 50.0);
    assert_eq!(
        second.review.iter().map(|r| r.is_correct).collect::<Vec<_>>(),
        vec![true, false, true, false]
    );

    // one answer set survives, both attempts stay
    let answers = app.db.answers.read().await.clone();
    assert_eq!(answers.len(), 4);
    assert!(answers.iter().all(|a| a.attempt_id == second.attempt.id));
    assert_eq!(app.db.attempts.read().await.len(), 2);

    let stats = app.state.dashboard_service.user_stats(&user.id).await.unwrap();
    assert_eq!(stats.quizzes_taken, 2);
    assert_eq!(stats.average_score, 75.0);
    assert_eq!(stats.best_score, 100.0);
    assert_eq!(stats.total_questions_answered, 8);
}

#[tokio::test]
async fn superseded_attempt_has_no_review() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let ids = question_ids(&app).await;
    let service = &app.state.quiz_attempt_service;

    let answers = || {
        request(
            &ids,
            vec![
                SubmittedResponse::Index(2),
                SubmittedResponse::Index(4),
                SubmittedResponse::Index(1),
                SubmittedResponse::Text("1,3".into()),
            ],
        )
    };
    let first = service.submit(&user.id, &quiz.id, answers()).await.unwrap();
    let second = service.submit(&user.id, &quiz.id, answers()).await.unwrap();

    let old = service.score_details(&user.id, &first.attempt.id).await.unwrap();
    assert!(!old.review_available);
    assert!(old.results.is_empty());

    let latest = service.score_details(&user.id, &second.attempt.id).await.unwrap();
    assert!(latest.review_available);
    assert_eq!(latest.results.len(), 4);

    let err = service
        .score_details("someone-else", &second.attempt.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn unanswered_questions_count_as_wrong() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let ids = question_ids(&app).await;

    let mut answers = HashMap::new();
    answers.insert(ids[0].clone(), Some(SubmittedResponse::Index(2)));
    answers.insert(ids[1].clone(), None);
    answers.insert(ids[2].clone(), Some(SubmittedResponse::Index(0)));
    answers.insert("not-a-question".to_string(), Some(SubmittedResponse::Index(1)));

    let result = app
        .state
        .quiz_attempt_service
        .submit(
            &user.id,
            &quiz.id,
            SubmitQuizRequest {
                answers,
                start_time: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(result.attempt.total_scored, 1);
    assert_eq!(result.attempt.total_questions, 4);
    let rows = app.db.answers.read().await.clone();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.iter().filter(|a| a.selected_options.is_empty()).count(), 3);
}

#[tokio::test]
async fn inactive_quiz_writes_nothing() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    app.db.quizzes.write().await[0].is_active = false;
    let ids = question_ids(&app).await;

    let err = app
        .state
        .quiz_attempt_service
        .submit(&user.id, &quiz.id, request(&ids, vec![SubmittedResponse::Index(2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(app.db.attempts.read().await.is_empty());
    assert!(app.db.answers.read().await.is_empty());
}

#[tokio::test]
async fn empty_and_unknown_quizzes_are_rejected() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, vec![]).await;
    let service = &app.state.quiz_attempt_service;

    let err = service
        .submit(&user.id, &quiz.id, SubmitQuizRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = service
        .submit(&user.id, "no-such-quiz", SubmitQuizRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(app.db.attempts.read().await.is_empty());
}

#[tokio::test]
async fn malformed_answer_rejects_whole_submission() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let ids = question_ids(&app).await;

    let err = app
        .state
        .quiz_attempt_service
        .submit(
            &user.id,
            &quiz.id,
            request(
                &ids,
                vec![SubmittedResponse::Index(2), SubmittedResponse::Index(7)],
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert!(app.db.attempts.read().await.is_empty());
    assert!(app.db.answers.read().await.is_empty());
}

#[tokio::test]
async fn failed_write_leaves_previous_result_intact() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let ids = question_ids(&app).await;
    let service = &app.state.quiz_attempt_service;

    let first = service
        .submit(&user.id, &quiz.id, request(&ids, vec![SubmittedResponse::Index(2)]))
        .await
        .unwrap();

    *app.db.fail_writes.write().await = true;
    let err = service
        .submit(&user.id, &quiz.id, request(&ids, vec![SubmittedResponse::Index(1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DatabaseError(_)));

    let answers = app.db.answers.read().await.clone();
    assert_eq!(app.db.attempts.read().await.len(), 1);
    assert!(answers.iter().all(|a| a.attempt_id == first.attempt.id));
}

#[tokio::test]
async fn time_taken_comes_from_start_time() {
    let app = test_app();
    let user = learner(&app).await;
    let quiz = seed_quiz(&app.db, four_questions()).await;
    let started = chrono::Utc::now() - chrono::Duration::seconds(90);

    let result = app
        .state
        .quiz_attempt_service
        .submit(
            &user.id,
            &quiz.id,
            SubmitQuizRequest {
                answers: HashMap::new(),
                start_time: Some(started.to_rfc3339()),
            },
        )
        .await
        .unwrap();

    assert!(result.attempt.time_taken_seconds >= 90);
    assert!(result.attempt.time_taken_seconds < 120);
    assert_eq!(result.attempt.total_scored, 0);
    assert_eq!(result.attempt.percentage, 0.0);
}
