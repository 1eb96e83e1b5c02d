use async_graphql::SimpleObject;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::domain::{Question, QuestionType, Quiz, QuizAttempt};
use crate::services::statistics::{round_to, PerformanceLadder};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuizSummaryDto {
    pub id: String,
    pub chapter_id: String,
    pub chapter_name: Option<String>,
    pub subject_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub date_of_quiz: NaiveDate,
    pub is_active: bool,
    pub questions_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_has_attempted: Option<bool>,
}

impl QuizSummaryDto {
    pub fn from_quiz(quiz: Quiz, questions_count: i64) -> Self {
        QuizSummaryDto {
            id: quiz.id,
            chapter_id: quiz.chapter_id,
            chapter_name: None,
            subject_name: None,
            title: quiz.title,
            description: quiz.description,
            duration_minutes: quiz.duration_minutes,
            date_of_quiz: quiz.date_of_quiz,
            is_active: quiz.is_active,
            questions_count,
            user_has_attempted: None,
        }
    }

    pub fn with_names(mut self, chapter_name: Option<String>, subject_name: Option<String>) -> Self {
        self.chapter_name = chapter_name;
        self.subject_name = subject_name;
        self
    }
}

/// Question as shown while a quiz is being taken. Carries no answer.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionForTaking {
    pub id: String,
    pub quiz_id: String,
    pub statement: String,
    pub options: Vec<String>,
    pub question_type: QuestionType,
}

impl From<Question> for QuestionForTaking {
    fn from(question: Question) -> Self {
        QuestionForTaking {
            id: question.id,
            quiz_id: question.quiz_id,
            statement: question.statement,
            options: question.options.to_vec(),
            question_type: question.question_type,
        }
    }
}

/// Full question for administrators, answer included.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDto {
    pub id: String,
    pub quiz_id: String,
    pub statement: String,
    pub options: Vec<String>,
    pub question_type: QuestionType,
    pub correct_answer: String,
    pub correct_answers: Vec<i32>,
    pub marks: i32,
    pub negative_marks: i32,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Question> for QuestionDto {
    fn from(question: Question) -> Self {
        QuestionDto {
            correct_answer: question.correct_answer.to_string(),
            correct_answers: question.correct_answer.indices(),
            id: question.id,
            quiz_id: question.quiz_id,
            statement: question.statement,
            options: question.options.to_vec(),
            question_type: question.question_type,
            marks: question.marks,
            negative_marks: question.negative_marks,
            created_at: question.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuizForTaking {
    pub quiz: QuizSummaryDto,
    pub questions: Vec<QuestionForTaking>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptDto {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub quiz_title: Option<String>,
    pub total_scored: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub performance: String,
    pub time_taken_seconds: i64,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptDto {
    pub fn new(attempt: QuizAttempt, quiz_title: Option<String>, ladder: &PerformanceLadder) -> Self {
        let percentage = attempt.percentage();
        AttemptDto {
            percentage: round_to(percentage, 2),
            performance: ladder.bucket(percentage).to_string(),
            id: attempt.id,
            user_id: attempt.user_id,
            quiz_id: attempt.quiz_id,
            quiz_title,
            total_scored: attempt.total_scored,
            total_questions: attempt.total_questions,
            time_taken_seconds: attempt.time_taken_seconds,
            submitted_at: attempt.submitted_at,
        }
    }
}

/// Post-submission view of one question, answer revealed.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionReview {
    pub question_id: String,
    pub statement: String,
    pub options: Vec<String>,
    pub question_type: QuestionType,
    pub correct_answer: Vec<i32>,
    pub selected_answer: Vec<i32>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct SubmissionResult {
    pub message: String,
    pub attempt: AttemptDto,
    pub review: Vec<QuestionReview>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ScoreDetails {
    pub attempt: AttemptDto,
    /// False when a later retake has superseded this attempt's answer rows.
    pub review_available: bool,
    pub results: Vec<QuestionReview>,
}
