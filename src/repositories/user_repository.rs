use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{self, Database},
    errors::{AppError, AppResult},
    models::domain::{User, UserRole},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> AppResult<User>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<User>>;
    async fn find_by_role_paginated(
        &self,
        role: UserRole,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<User>, i64)>;
    async fn update(&self, user: User) -> AppResult<User>;
    async fn count_by_role(&self, role: UserRole) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection(db::USERS);
        Self { collection }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        self.collection.insert_one(&user).await.map_err(|e| match AppError::from(e) {
            AppError::AlreadyExists(_) => {
                AppError::AlreadyExists(format!("Email '{}' is already registered", user.email))
            }
            other => other,
        })?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user = self.collection.find_one(doc! { "id": id }).await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<User>> {
        let users = self
            .collection
            .find(doc! { "role": to_bson(&role)? })
            .sort(doc! { "email": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn find_by_role_paginated(
        &self,
        role: UserRole,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        let filter = doc! { "role": to_bson(&role)? };
        let total = self.collection.count_documents(filter.clone()).await?;

        let users = self
            .collection
            .find(filter)
            .sort(doc! { "email": 1 })
            .skip(offset as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((users, total as i64))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let result = self
            .collection
            .replace_one(doc! { "id": &user.id }, &user)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!("User '{}' not found", user.id)));
        }

        Ok(user)
    }

    async fn count_by_role(&self, role: UserRole) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! { "role": to_bson(&role)? })
            .await?;
        Ok(count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let email_model = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection.create_index(id_model).await?;
        self.collection.create_index(email_model).await?;
        log::info!("Created unique indexes on users.id and users.email");

        Ok(())
    }
}
