use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::Question,
    repositories::cascade::CascadeDelete,
};

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: Question) -> AppResult<Question>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>>;
    /// Questions of a quiz in creation order.
    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>>;
    async fn update(&self, question: Question) -> AppResult<Question>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn count_by_quiz(&self, quiz_id: &str) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuestionRepository {
    collection: Collection<Question>,
    cascade: CascadeDelete,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection(db::QUESTIONS),
            cascade: CascadeDelete::new(db),
        }
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>> {
        let mut questions: Vec<Question> = self
            .collection
            .find(doc! { "quiz_id": quiz_id })
            .await?
            .try_collect()
            .await?;
        // created_at is an RFC 3339 string in storage; order here, not in the query
        questions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(questions)
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let result = self
            .collection
            .replace_one(doc! { "id": &question.id }, &question)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Question '{}' not found", question.id)));
        }
        Ok(question)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.cascade.question(id).await? {
            return Err(AppError::NotFound(format!("Question '{}' not found", id)));
        }
        Ok(())
    }

    async fn count_by_quiz(&self, quiz_id: &str) -> AppResult<u64> {
        Ok(self
            .collection
            .count_documents(doc! { "quiz_id": quiz_id })
            .await?)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let quiz_model = IndexModel::builder().keys(doc! { "quiz_id": 1 }).build();

        self.collection.create_index(id_model).await?;
        self.collection.create_index(quiz_model).await?;
        log::info!("Created indexes for questions collection");

        Ok(())
    }
}
