use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Subject {
    pub id: String,
    pub name: String, // unique
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Subject {
    pub fn new(name: &str, description: Option<String>) -> Self {
        Subject {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description,
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Chapter {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Chapter {
    pub fn new(subject_id: &str, name: &str, description: Option<String>) -> Self {
        Chapter {
            id: Uuid::new_v4().to_string(),
            subject_id: subject_id.to_string(),
            name: name.trim().to_string(),
            description,
            created_at: Some(Utc::now()),
        }
    }
}
