#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use quizmaster_server::{
    app_state::AppState,
    config::Config,
    db::HealthCheck,
    errors::{AppError, AppResult},
    models::domain::{Question, Quiz},
    test_utils::fixtures,
};

pub use quizmaster_server::test_utils::{mail::RecordingMailer, memory::MemoryStore};

pub struct StaticHealth(pub bool);

#[async_trait]
impl HealthCheck for StaticHealth {
    async fn health_check(&self) -> AppResult<()> {
        if self.0 {
            Ok(())
        } else {
            Err(AppError::DatabaseError("ping failed".to_string()))
        }
    }
}

pub struct TestApp {
    pub db: MemoryStore,
    pub mailer: RecordingMailer,
    pub state: AppState,
}

/// Application state over in-memory storage. Needs a running tokio runtime.
pub fn test_app() -> TestApp {
    let db = MemoryStore::default();
    let mailer = RecordingMailer::default();
    let state = AppState::from_parts(
        Config::from_env(),
        db.repositories(),
        Arc::new(StaticHealth(true)),
        Arc::new(mailer.clone()),
    );
    TestApp { db, mailer, state }
}

/// Subject > chapter > active quiz, stored and returned.
pub async fn seed_quiz(db: &MemoryStore, questions: Vec<Question>) -> Quiz {
    let (subject, chapter, quiz) = fixtures::quiz_tree();
    db.add_subject(subject).await;
    db.add_chapter(chapter).await;
    db.add_quiz(quiz.clone()).await;
    for mut question in questions {
        question.quiz_id = quiz.id.clone();
        db.add_question(question).await;
    }
    quiz
}
