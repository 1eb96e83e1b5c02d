use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::Chapter,
    repositories::cascade::CascadeDelete,
};

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn create(&self, chapter: Chapter) -> AppResult<Chapter>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Chapter>>;
    async fn find_all(&self) -> AppResult<Vec<Chapter>>;
    async fn find_by_subject(&self, subject_id: &str) -> AppResult<Vec<Chapter>>;
    async fn update(&self, chapter: Chapter) -> AppResult<Chapter>;
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoChapterRepository {
    collection: Collection<Chapter>,
    cascade: CascadeDelete,
}

impl MongoChapterRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection(db::CHAPTERS),
            cascade: CascadeDelete::new(db),
        }
    }
}

#[async_trait]
impl ChapterRepository for MongoChapterRepository {
    async fn create(&self, chapter: Chapter) -> AppResult<Chapter> {
        self.collection.insert_one(&chapter).await?;
        Ok(chapter)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Chapter>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn find_all(&self) -> AppResult<Vec<Chapter>> {
        let chapters = self
            .collection
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(chapters)
    }

    async fn find_by_subject(&self, subject_id: &str) -> AppResult<Vec<Chapter>> {
        let chapters = self
            .collection
            .find(doc! { "subject_id": subject_id })
            .sort(doc! { "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(chapters)
    }

    async fn update(&self, chapter: Chapter) -> AppResult<Chapter> {
        let result = self
            .collection
            .replace_one(doc! { "id": &chapter.id }, &chapter)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Chapter '{}' not found", chapter.id)));
        }
        Ok(chapter)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.cascade.chapter(id).await? {
            return Err(AppError::NotFound(format!("Chapter '{}' not found", id)));
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let subject_model = IndexModel::builder()
            .keys(doc! { "subject_id": 1 })
            .build();

        self.collection.create_index(id_model).await?;
        self.collection.create_index(subject_model).await?;
        log::info!("Created indexes for chapters collection");

        Ok(())
    }
}
