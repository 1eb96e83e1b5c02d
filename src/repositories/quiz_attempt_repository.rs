use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::IndexOptions,
    ClientSession, Collection, IndexModel,
};

use crate::{
    db::{self, Database},
    errors::AppResult,
    models::domain::quiz_attempt::{QuizAttempt, UserAnswer},
};

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Replaces the (user, quiz) answer rows with `answers` and stores
    /// `attempt`, all or nothing.
    async fn record_submission(
        &self,
        attempt: QuizAttempt,
        answers: Vec<UserAnswer>,
    ) -> AppResult<QuizAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;
    /// Newest first.
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>>;
    async fn find_by_user_and_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>>;
    async fn find_answers(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<UserAnswer>>;
    async fn has_user_attempted_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool>;
    /// Attempts submitted at or after `since`, newest first.
    async fn find_since(&self, since: DateTime<Utc>) -> AppResult<Vec<QuizAttempt>>;
    async fn count(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuizAttemptRepository {
    db: Database,
    attempts: Collection<QuizAttempt>,
    answers: Collection<UserAnswer>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            attempts: db.get_collection(db::QUIZ_ATTEMPTS),
            answers: db.get_collection(db::USER_ANSWERS),
        }
    }

    async fn write_submission(
        &self,
        attempt: &QuizAttempt,
        answers: &[UserAnswer],
        session: &mut ClientSession,
    ) -> AppResult<()> {
        let removed = self
            .answers
            .delete_many(doc! { "user_id": &attempt.user_id, "quiz_id": &attempt.quiz_id })
            .session(&mut *session)
            .await?;

        if !answers.is_empty() {
            self.answers
                .insert_many(answers)
                .session(&mut *session)
                .await?;
        }

        self.attempts
            .insert_one(attempt)
            .session(&mut *session)
            .await?;

        log::debug!(
            "Replaced {} answer rows with {} for user {} on quiz {}",
            removed.deleted_count,
            answers.len(),
            attempt.user_id,
            attempt.quiz_id
        );
        Ok(())
    }

    async fn find_newest_first(&self, filter: Document) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .attempts
            .find(filter)
            .sort(doc! { "submitted_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }
}

fn since_filter(since: DateTime<Utc>) -> Document {
    doc! { "submitted_at": { "$gte": bson::DateTime::from_chrono(since) } }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn record_submission(
        &self,
        attempt: QuizAttempt,
        answers: Vec<UserAnswer>,
    ) -> AppResult<QuizAttempt> {
        let mut session = self.db.begin_transaction().await?;
        let result = self.write_submission(&attempt, &answers, &mut session).await;
        Database::finish_transaction(session, result).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.attempts.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
        self.find_newest_first(doc! { "user_id": user_id }).await
    }

    async fn find_by_user_and_quiz(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> AppResult<Vec<QuizAttempt>> {
        self.find_newest_first(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await
    }

    async fn find_answers(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<UserAnswer>> {
        let answers = self
            .answers
            .find(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await?
            .try_collect()
            .await?;
        Ok(answers)
    }

    async fn has_user_attempted_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool> {
        let attempt = self
            .attempts
            .find_one(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await?;
        Ok(attempt.is_some())
    }

    async fn find_since(&self, since: DateTime<Utc>) -> AppResult<Vec<QuizAttempt>> {
        self.find_newest_first(since_filter(since)).await
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.attempts.count_documents(doc! {}).await?)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts and user_answers collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_quiz_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1 })
            .options(IndexOptions::builder().name("user_quiz".to_string()).build())
            .build();

        let submitted_index = IndexModel::builder()
            .keys(doc! { "submitted_at": -1 })
            .options(IndexOptions::builder().name("submitted_at".to_string()).build())
            .build();

        let answer_unique_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_quiz_question_unique".to_string())
                    .build(),
            )
            .build();

        self.attempts.create_index(id_index).await?;
        self.attempts.create_index(user_quiz_index).await?;
        self.attempts.create_index(submitted_index).await?;
        self.answers.create_index(answer_unique_index).await?;

        log::info!("Successfully created indexes for quiz_attempts and user_answers");
        Ok(())
    }
}
