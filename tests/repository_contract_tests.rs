mod common;

use chrono::{Duration, Utc};

use quizmaster_server::{
    errors::AppError,
    models::domain::{
        AnswerKey, Question, QuestionType, QuizAttempt, RefreshToken, User, UserAnswer, UserRole,
    },
    repositories::{
        QuestionRepository, QuizAttemptRepository, QuizRepository, RefreshTokenRepository,
        SubjectRepository, UserRepository,
    },
};

use common::{seed_quiz, MemoryStore};

fn make_question() -> Question {
    Question::new(
        "pending",
        "2 + 2 = ?",
        ["3".into(), "4".into(), "5".into(), "22".into()],
        QuestionType::Single,
        AnswerKey::single(2).unwrap(),
        1,
        0,
    )
    .unwrap()
}

fn make_answer(attempt: &QuizAttempt, question_id: &str, selected: Vec<i32>) -> UserAnswer {
    UserAnswer {
        id: uuid::Uuid::new_v4().to_string(),
        attempt_id: attempt.id.clone(),
        user_id: attempt.user_id.clone(),
        quiz_id: attempt.quiz_id.clone(),
        question_id: question_id.to_string(),
        is_correct: selected == vec![2],
        selected_options: selected,
        answered_at: attempt.submitted_at,
    }
}

#[tokio::test]
async fn user_emails_are_unique_and_normalized() {
    let db = MemoryStore::default();
    UserRepository::create(
        &db,
        User::new("Sam@Example.com", "Sam", None, None, "hash".into()),
    )
    .await
    .unwrap();

    let err = UserRepository::create(
        &db,
        User::new("sam@example.com", "Other Sam", None, None, "hash".into()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));

    let found = db.find_by_email(" SAM@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.full_name), Some("Sam".to_string()));
}

#[tokio::test]
async fn role_pagination_reports_total() {
    let db = MemoryStore::default();
    for i in 0..5 {
        UserRepository::create(
            &db,
            User::new(&format!("user{}@example.com", i), "User", None, None, "hash".into()),
        )
        .await
        .unwrap();
    }
    UserRepository::create(&db, User::new_admin("admin@example.com", "hash".into()))
        .await
        .unwrap();

    let (page, total) = db.find_by_role_paginated(UserRole::User, 4, 10).await.unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 1);
    assert_eq!(db.count_by_role(UserRole::Admin).await.unwrap(), 1);
}

#[tokio::test]
async fn record_submission_replaces_answers_but_keeps_attempts() {
    let db = MemoryStore::default();
    let quiz = seed_quiz(&db, vec![make_question()]).await;
    let question_id = db.questions.read().await[0].id.clone();

    let first = QuizAttempt::new("u1", &quiz.id, 0, 1, 10, Utc::now() - Duration::minutes(5));
    db.record_submission(first.clone(), vec![make_answer(&first, &question_id, vec![1])])
        .await
        .unwrap();

    let second = QuizAttempt::new("u1", &quiz.id, 1, 1, 8, Utc::now());
    db.record_submission(second.clone(), vec![make_answer(&second, &question_id, vec![2])])
        .await
        .unwrap();

    let answers = db.find_answers("u1", &quiz.id).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].attempt_id, second.id);

    let attempts = db.find_by_user_and_quiz("u1", &quiz.id).await.unwrap();
    assert_eq!(
        attempts.iter().map(|a| a.id.clone()).collect::<Vec<_>>(),
        vec![second.id.clone(), first.id.clone()]
    );
    assert!(db.has_user_attempted_quiz("u1", &quiz.id).await.unwrap());
    assert!(!db.has_user_attempted_quiz("u2", &quiz.id).await.unwrap());
}

#[tokio::test]
async fn answers_of_other_users_are_untouched() {
    let db = MemoryStore::default();
    let quiz = seed_quiz(&db, vec![make_question()]).await;
    let question_id = db.questions.read().await[0].id.clone();

    for user in ["u1", "u2"] {
        let attempt = QuizAttempt::new(user, &quiz.id, 1, 1, 10, Utc::now());
        db.record_submission(attempt.clone(), vec![make_answer(&attempt, &question_id, vec![2])])
            .await
            .unwrap();
    }
    let retake = QuizAttempt::new("u1", &quiz.id, 0, 1, 10, Utc::now());
    db.record_submission(retake, vec![]).await.unwrap();

    assert!(db.find_answers("u1", &quiz.id).await.unwrap().is_empty());
    assert_eq!(db.find_answers("u2", &quiz.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_since_is_inclusive_and_newest_first() {
    let db = MemoryStore::default();
    let cutoff = Utc::now() - Duration::days(30);

    for (quiz, at) in [
        ("old", cutoff - Duration::seconds(1)),
        ("edge", cutoff),
        ("new", Utc::now()),
    ] {
        db.record_submission(QuizAttempt::new("u1", quiz, 1, 1, 1, at), vec![])
            .await
            .unwrap();
    }

    let recent = db.find_since(cutoff).await.unwrap();
    assert_eq!(
        recent.iter().map(|a| a.quiz_id.as_str()).collect::<Vec<_>>(),
        vec!["new", "edge"]
    );
}

#[tokio::test]
async fn deleting_a_subject_cascades_to_results() {
    let db = MemoryStore::default();
    let quiz = seed_quiz(&db, vec![make_question(), make_question()]).await;
    let subject_id = db.subjects.read().await[0].id.clone();
    let attempt = QuizAttempt::new("u1", &quiz.id, 1, 2, 10, Utc::now());
    db.record_submission(attempt, vec![]).await.unwrap();

    SubjectRepository::delete(&db, &subject_id).await.unwrap();

    assert!(QuizRepository::find_by_id(&db, &quiz.id).await.unwrap().is_none());
    assert_eq!(db.count_by_quiz(&quiz.id).await.unwrap(), 0);
    assert_eq!(QuizAttemptRepository::count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn questions_keep_creation_order() {
    let db = MemoryStore::default();
    let quiz = seed_quiz(&db, vec![]).await;

    let mut created = Vec::new();
    for _ in 0..3 {
        let mut question = make_question();
        question.quiz_id = quiz.id.clone();
        created.push(QuestionRepository::create(&db, question).await.unwrap().id);
    }

    let listed: Vec<String> = db
        .find_by_quiz(&quiz.id)
        .await
        .unwrap()
        .into_iter()
        .map(|q| q.id)
        .collect();
    assert_eq!(listed, created);
}

#[tokio::test]
async fn refresh_tokens_revoke_per_user() {
    let db = MemoryStore::default();
    let expires = Utc::now() + Duration::hours(1);

    for token in ["t1", "t2"] {
        RefreshTokenRepository::create(&db, RefreshToken::new("u1", token, expires))
            .await
            .unwrap();
    }
    RefreshTokenRepository::create(&db, RefreshToken::new("u2", "t3", expires))
        .await
        .unwrap();

    assert_eq!(db.revoke_all_for_user("u1").await.unwrap(), 2);
    assert_eq!(db.revoke_all_for_user("u1").await.unwrap(), 0);

    let hash = quizmaster_server::models::domain::refresh_token::hash_token("t3");
    let other = db.find_by_token_hash(&hash).await.unwrap().unwrap();
    assert!(other.is_valid());
}
