use async_graphql::SimpleObject;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct Quiz {
    pub id: String,
    pub chapter_id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub date_of_quiz: NaiveDate,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(
        chapter_id: &str,
        title: &str,
        description: Option<String>,
        duration_minutes: i32,
        date_of_quiz: NaiveDate,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            chapter_id: chapter_id.to_string(),
            title: title.to_string(),
            description,
            duration_minutes,
            date_of_quiz,
            is_active: true,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }
}
