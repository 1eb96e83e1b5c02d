use std::collections::HashMap;

use async_graphql::InputObject;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::domain::question::{AnswerKey, QuestionType, Selection, OPTION_COUNT};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100))]
    pub full_name: String,

    #[validate(length(min = 1, max = 100))]
    pub qualification: String,

    /// `YYYY-MM-DD`
    pub dob: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub qualification: Option<String>,

    pub dob: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(min = 6, max = 128))]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 100, message = "Subject name is required"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChapterRequest {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject_id: String,

    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateChapterRequest {
    #[validate(length(min = 1))]
    pub subject_id: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, message = "Chapter is required"))]
    pub chapter_id: String,

    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_minutes: i32,

    /// `YYYY-MM-DD`
    pub date_of_quiz: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1))]
    pub chapter_id: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: Option<i32>,

    pub date_of_quiz: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 5000, message = "Question statement is required"))]
    pub statement: String,

    #[validate(length(equal = 4, message = "Exactly 4 options are required"))]
    pub options: Vec<String>,

    #[serde(default)]
    pub question_type: QuestionType,

    /// `"2"` for single choice, `"1,3"` for multiple choice.
    pub correct_answer: String,

    #[serde(default = "default_marks")]
    #[validate(range(min = 1))]
    pub marks: i32,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub negative_marks: i32,
}

fn default_marks() -> i32 {
    1
}

impl QuestionRequest {
    pub fn option_array(&self) -> AppResult<[String; OPTION_COUNT]> {
        self.options.clone().try_into().map_err(|_| {
            AppError::ValidationError(format!("Exactly {} options are required", OPTION_COUNT))
        })
    }

    pub fn answer_key(&self) -> AppResult<AnswerKey> {
        self.correct_answer.parse()
    }
}

/// One submitted response as it arrives over JSON: `2`, `"02"`, `[1, 3]`
/// or `"1,3"`. `null` and `0` mean unanswered.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubmittedResponse {
    Index(i64),
    Indices(Vec<i64>),
    Text(String),
}

impl SubmittedResponse {
    pub fn to_selection(&self) -> AppResult<Selection> {
        match self {
            SubmittedResponse::Index(index) => AnswerKey::from_indices([*index]),
            SubmittedResponse::Indices(indices) => AnswerKey::from_indices(indices.iter().copied()),
            SubmittedResponse::Text(text) => text.parse(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: HashMap<String, Option<SubmittedResponse>>,

    /// RFC 3339 timestamp handed out when the quiz was started.
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, InputObject)]
pub struct QuestionAnswerInput {
    pub question_id: String,
    pub selected_options: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize, InputObject)]
pub struct SubmitQuizAttemptInput {
    pub quiz_id: String,
    pub answers: Vec<QuestionAnswerInput>,
    pub start_time: Option<String>,
}

impl From<SubmitQuizAttemptInput> for SubmitQuizRequest {
    fn from(input: SubmitQuizAttemptInput) -> Self {
        let answers = input
            .answers
            .into_iter()
            .map(|answer| {
                let indices = answer.selected_options.into_iter().map(i64::from).collect();
                (answer.question_id, Some(SubmittedResponse::Indices(indices)))
            })
            .collect();

        SubmitQuizRequest {
            answers,
            start_time: input.start_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

pub fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::ValidationError(format!("Invalid {} format. Use YYYY-MM-DD", field))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Jane Doe".to_string(),
            qualification: "B.Sc".to_string(),
            dob: "2000-01-01".to_string(),
        }
    }

    #[test]
    fn test_valid_register_request() {
        assert!(register_request("jane@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn test_invalid_email_and_short_password() {
        assert!(register_request("not-an-email", "secret1").validate().is_err());
        assert!(register_request("jane@example.com", "123").validate().is_err());
    }

    #[test]
    fn test_question_request_requires_four_options() {
        let request = QuestionRequest {
            statement: "2 + 2?".to_string(),
            options: vec!["3".into(), "4".into(), "5".into()],
            question_type: QuestionType::Single,
            correct_answer: "2".to_string(),
            marks: 1,
            negative_marks: 0,
        };
        assert!(request.validate().is_err());
        assert!(request.option_array().is_err());
    }

    #[test]
    fn test_question_request_defaults() {
        let json = r#"{
            "statement": "2 + 2?",
            "options": ["3", "4", "5", "6"],
            "correct_answer": "2"
        }"#;
        let request: QuestionRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.question_type, QuestionType::Single);
        assert_eq!(request.marks, 1);
        assert_eq!(request.negative_marks, 0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_submitted_response_accepts_all_wire_shapes() {
        let json = r#"{
            "answers": { "q1": 2, "q2": "03", "q3": [3, 1, 1], "q4": "1,3", "q5": null, "q6": 0 },
            "start_time": "2024-05-01T10:00:00Z"
        }"#;
        let request: SubmitQuizRequest = serde_json::from_str(json).unwrap();

        let selection = |key: &str| {
            request.answers[key]
                .as_ref()
                .map(|r| r.to_selection().unwrap())
                .unwrap_or_default()
        };

        assert_eq!(selection("q1").indices(), vec![2]);
        assert_eq!(selection("q2").indices(), vec![3]);
        assert_eq!(selection("q3").indices(), vec![1, 3]);
        assert_eq!(selection("q4").indices(), vec![1, 3]);
        assert!(selection("q5").is_empty());
        assert!(selection("q6").is_empty());
    }

    #[test]
    fn test_submitted_response_rejects_malformed_values() {
        assert!(SubmittedResponse::Index(7).to_selection().is_err());
        assert!(SubmittedResponse::Text("two".into()).to_selection().is_err());
    }

    #[test]
    fn test_graphql_input_converts_to_submission() {
        let input = SubmitQuizAttemptInput {
            quiz_id: "quiz-1".to_string(),
            answers: vec![QuestionAnswerInput {
                question_id: "q1".to_string(),
                selected_options: vec![1, 3],
            }],
            start_time: None,
        };

        let request = SubmitQuizRequest::from(input);
        assert_eq!(
            request.answers["q1"],
            Some(SubmittedResponse::Indices(vec![1, 3]))
        );
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2024-02-29", "dob").is_ok());
        assert!(parse_date("29/02/2024", "dob").is_err());
    }

    #[test]
    fn test_pagination_clamps_limit() {
        let params = PaginationParams {
            offset: Some(-5),
            limit: Some(1000),
        };
        assert_eq!(params.offset(), 0);
        assert_eq!(params.limit(), 100);
    }
}
