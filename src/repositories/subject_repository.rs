use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::Subject,
    repositories::cascade::CascadeDelete,
};

#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn create(&self, subject: Subject) -> AppResult<Subject>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>>;
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Subject>>;
    async fn find_all(&self) -> AppResult<Vec<Subject>>;
    async fn update(&self, subject: Subject) -> AppResult<Subject>;
    /// Removes the subject with its chapters, quizzes, questions and results.
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn count(&self) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoSubjectRepository {
    collection: Collection<Subject>,
    cascade: CascadeDelete,
}

impl MongoSubjectRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.get_collection(db::SUBJECTS),
            cascade: CascadeDelete::new(db),
        }
    }
}

#[async_trait]
impl SubjectRepository for MongoSubjectRepository {
    async fn create(&self, subject: Subject) -> AppResult<Subject> {
        self.collection.insert_one(&subject).await?;
        Ok(subject)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>> {
        Ok(self.collection.find_one(doc! { "id": id }).await?)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Subject>> {
        Ok(self.collection.find_one(doc! { "name": name.trim() }).await?)
    }

    async fn find_all(&self) -> AppResult<Vec<Subject>> {
        let subjects = self
            .collection
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(subjects)
    }

    async fn update(&self, subject: Subject) -> AppResult<Subject> {
        let result = self
            .collection
            .replace_one(doc! { "id": &subject.id }, &subject)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("Subject '{}' not found", subject.id)));
        }
        Ok(subject)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.cascade.subject(id).await? {
            return Err(AppError::NotFound(format!("Subject '{}' not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let name_model = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(id_model).await?;
        self.collection.create_index(name_model).await?;
        log::info!("Created unique indexes on subjects.id and subjects.name");

        Ok(())
    }
}
