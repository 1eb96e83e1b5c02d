use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime as bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::statistics;

/// One scored submission. Never updated once written.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub total_scored: i32,
    pub total_questions: i32,
    pub time_taken_seconds: i64,
    #[serde(with = "bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(
        user_id: &str,
        quiz_id: &str,
        total_scored: i32,
        total_questions: i32,
        time_taken_seconds: i64,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            total_scored,
            total_questions,
            time_taken_seconds: time_taken_seconds.max(0),
            submitted_at,
        }
    }

    pub fn percentage(&self) -> f64 {
        statistics::percentage(self.total_scored, self.total_questions)
    }
}

/// Per-question response of the latest attempt for a (user, quiz) pair.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserAnswer {
    pub id: String,
    pub attempt_id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub question_id: String,
    pub selected_options: Vec<i32>, // empty when unanswered
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl UserAnswer {
    pub fn is_answered(&self) -> bool {
        !self.selected_options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_attempt(total_scored: i32, total_questions: i32) -> QuizAttempt {
        QuizAttempt::new("user-1", "quiz-1", total_scored, total_questions, 95, Utc::now())
    }

    #[test]
    fn attempt_percentage_uses_its_own_totals() {
        assert_eq!(make_attempt(3, 4).percentage(), 75.0);
        assert_eq!(make_attempt(0, 0).percentage(), 0.0);
    }

    #[test]
    fn attempt_never_stores_negative_time() {
        let attempt = QuizAttempt::new("user-1", "quiz-1", 1, 1, -30, Utc::now());
        assert_eq!(attempt.time_taken_seconds, 0);
    }

    #[test]
    fn attempt_is_stored_with_a_bson_datetime() {
        use chrono::TimeZone;
        use mongodb::bson;

        let submitted = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let attempt = QuizAttempt::new("user-1", "quiz-1", 2, 4, 95, submitted);

        let doc = bson::to_document(&attempt).expect("attempt should serialize");
        let stored = doc.get_datetime("submitted_at").expect("stored as a BSON datetime");
        assert_eq!(stored.timestamp_millis(), submitted.timestamp_millis());

        let parsed: QuizAttempt = bson::from_document(doc).expect("attempt should deserialize");
        assert_eq!(parsed, attempt);
    }
}
