use async_graphql::Enum;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub qualification: Option<String>,
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub role: UserRole,
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        email: &str,
        full_name: &str,
        qualification: Option<String>,
        dob: Option<NaiveDate>,
        password_hash: String,
    ) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            full_name: full_name.to_string(),
            qualification,
            dob,
            role: UserRole::User,
            password_hash,
            created_at: Some(Utc::now()),
            last_login: None,
        }
    }

    pub fn new_admin(email: &str, password_hash: String) -> Self {
        let mut admin = User::new(
            email,
            "Administrator",
            Some("System Admin".to_string()),
            None,
            password_hash,
        );
        admin.role = UserRole::Admin;
        admin
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl User {
    pub fn test_user(email: &str) -> Self {
        User::new(email, "Test User", Some("B.Sc".to_string()), None, "hash".to_string())
    }
}
