use async_trait::async_trait;
use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, ClientSession, Collection,
};
use std::time::Duration;

use crate::{config::Config, errors::AppResult};

pub const USERS: &str = "users";
pub const SUBJECTS: &str = "subjects";
pub const CHAPTERS: &str = "chapters";
pub const QUIZZES: &str = "quizzes";
pub const QUESTIONS: &str = "questions";
pub const QUIZ_ATTEMPTS: &str = "quiz_attempts";
pub const USER_ANSWERS: &str = "user_answers";
pub const REFRESH_TOKENS: &str = "refresh_tokens";

#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

impl Database {
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let mut client_options = ClientOptions::parse(&config.mongo_conn_string).await?;

        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);
        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(2);
        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        log::info!("Connected to MongoDB database '{}'", config.mongo_db_name);

        Ok(Self {
            client,
            db_name: config.mongo_db_name.clone(),
        })
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    /// Session with an open transaction. Multi-document transactions need a
    /// replica set or sharded cluster.
    pub async fn begin_transaction(&self) -> AppResult<ClientSession> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        Ok(session)
    }

    /// Commits on `Ok`, aborts on `Err`. The original error wins over an
    /// abort failure, which is only logged.
    pub async fn finish_transaction<T>(
        mut session: ClientSession,
        result: AppResult<T>,
    ) -> AppResult<T> {
        match result {
            Ok(value) => {
                session.commit_transaction().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    log::warn!("Failed to abort transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }
}

/// Readiness probe for the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> AppResult<()>;
}

#[async_trait]
impl HealthCheck for Database {
    async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
