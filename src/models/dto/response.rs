use async_graphql::SimpleObject;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::domain::{Chapter, Subject, User, UserRole};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub qualification: Option<String>,
    pub dob: Option<NaiveDate>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            qualification: user.qualification,
            dob: user.dob,
            role: user.role,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectDto {
    #[serde(flatten)]
    pub subject: Subject,
    pub chapters_count: u64,
    pub quiz_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChapterDto {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub subject_name: Option<String>,
    pub quizzes_count: u64,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct UserDashboardStats {
    pub quizzes_taken: i64,
    pub average_score: f64,
    pub best_score: f64,
    pub total_questions_answered: i64,
    pub performance: String,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct GraphData {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboardStats {
    pub total_users: u64,
    pub total_subjects: u64,
    pub total_quizzes: u64,
    pub total_attempts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminChartData {
    pub labels: Vec<String>,
    pub attempts: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub total_attempts: usize,
    pub average_score: f64,
    pub performance: String,
}

#[derive(Debug, Serialize)]
pub struct PaginationMetadata {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub message: String,
    pub job: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_dto_hides_password_hash() {
        let user = User::test_user("john@example.com");

        let json = serde_json::to_value(UserDto::from(user)).unwrap();
        assert_eq!(json["email"], "john@example.com");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_subject_dto_flattens_subject() {
        let dto = SubjectDto {
            subject: Subject::new("Maths", None),
            chapters_count: 2,
            quiz_count: 5,
        };

        let json = serde_json::to_value(dto).unwrap();
        assert_eq!(json["name"], "Maths");
        assert_eq!(json["quiz_count"], 5);
    }
}
