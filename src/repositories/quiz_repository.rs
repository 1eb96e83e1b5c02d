use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::Quiz,
    repositories::cascade::CascadeDelete,
};

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>>;
    async fn find_all(&self) -> AppResult<Vec<Quiz>>;
    async fn find_active(&self) -> AppResult<Vec<Quiz>>;
    async fn find_by_chapter(&self, chapter_id: &str) -> AppResult<Vec<Quiz>>;
    async fn update(&self, quiz: Quiz) -> AppResult<Quiz>;
    /// Removes the quiz with its questions, attempts and answer rows.
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn count(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoQuizRepository {
    collection: Collection<Quiz>,
    cascade: CascadeDelete,
}

impl MongoQuizRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection(db::QUIZZES),
            cascade: CascadeDelete::new(db),
        }
    }
}

#[async_trait]
impl QuizRepository for MongoQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.collection.insert_one(&quiz).await?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        let quiz = self.collection.find_one(doc! { "id": id }).await?;
        Ok(quiz)
    }

    async fn find_all(&self) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .collection
            .find(doc! {})
            .sort(doc! { "date_of_quiz": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn find_active(&self) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .collection
            .find(doc! { "is_active": true })
            .sort(doc! { "date_of_quiz": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn find_by_chapter(&self, chapter_id: &str) -> AppResult<Vec<Quiz>> {
        let quizzes = self
            .collection
            .find(doc! { "chapter_id": chapter_id })
            .await?
            .try_collect()
            .await?;
        Ok(quizzes)
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let result = self
            .collection
            .replace_one(doc! { "id": &quiz.id }, &quiz)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Quiz '{}' not found", quiz.id)));
        }
        Ok(quiz)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.cascade.quiz(id).await? {
            return Err(AppError::NotFound(format!("Quiz '{}' not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quizzes collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();
        let chapter_index = IndexModel::builder()
            .keys(doc! { "chapter_id": 1 })
            .options(IndexOptions::builder().name("chapter_id".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(chapter_index).await?;

        log::info!("Successfully created indexes for quizzes collection");
        Ok(())
    }
}
