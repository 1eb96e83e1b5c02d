use std::{collections::BTreeSet, fmt, str::FromStr};

use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{AppError, AppResult};

pub const OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub statement: String,
    pub options: [String; OPTION_COUNT],
    pub question_type: QuestionType,
    pub correct_answer: AnswerKey,
    pub marks: i32,
    pub negative_marks: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single, // exactly one correct option
    Multiple, // a set of correct options
}

impl Question {
    pub fn new(
        quiz_id: &str,
        statement: &str,
        options: [String; OPTION_COUNT],
        question_type: QuestionType,
        correct_answer: AnswerKey,
        marks: i32,
        negative_marks: i32,
    ) -> AppResult<Self> {
        let question = Question {
            id: uuid::Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            statement: statement.to_string(),
            options,
            question_type,
            correct_answer,
            marks,
            negative_marks,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };
        question.validate()?;
        Ok(question)
    }

    /// Checks the invariants a stored question must always hold.
    pub fn validate(&self) -> AppResult<()> {
        if self.statement.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Question statement is required".to_string(),
            ));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(AppError::ValidationError(format!(
                "All {} options must be non-empty",
                OPTION_COUNT
            )));
        }
        if self.correct_answer.is_empty() {
            return Err(AppError::ValidationError(
                "Correct answer is required".to_string(),
            ));
        }
        if self.question_type == QuestionType::Single && self.correct_answer.len() != 1 {
            return Err(AppError::ValidationError(
                "Single-choice question must have exactly one correct option".to_string(),
            ));
        }
        if self.marks <= 0 {
            return Err(AppError::ValidationError(
                "Marks must be a positive integer".to_string(),
            ));
        }
        if self.negative_marks < 0 {
            return Err(AppError::ValidationError(
                "Negative marks cannot be below zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Set of 1-based option indices. Stored comma-joined (`"1,3"`).
#[derive(Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct AnswerKey(BTreeSet<u8>);

/// A submitted response normalized to option indices. Empty means unanswered.
pub type Selection = AnswerKey;

impl AnswerKey {
    pub fn single(index: u8) -> AppResult<Self> {
        Self::from_indices([index as i64])
    }

    pub fn unanswered() -> Self {
        AnswerKey(BTreeSet::new())
    }

    /// Builds a key from raw integers. `0` is the unanswered sentinel and is
    /// dropped; anything else outside 1..=4 is rejected.
    pub fn from_indices<I>(indices: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut set = BTreeSet::new();
        for index in indices {
            match index {
                0 => continue,
                1..=4 => {
                    set.insert(index as u8);
                }
                other => {
                    return Err(AppError::ValidationError(format!(
                        "Option index {} is out of range 1-{}",
                        other, OPTION_COUNT
                    )))
                }
            }
        }
        Ok(AnswerKey(set))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn indices(&self) -> Vec<i32> {
        self.0.iter().map(|&i| i as i32).collect()
    }

    /// First selected index, or the `0` sentinel when unanswered.
    pub fn first_or_sentinel(&self) -> i32 {
        self.0.iter().next().map(|&i| i as i32).unwrap_or(0)
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl FromStr for AnswerKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indices = s
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    AppError::ValidationError(format!("'{}' is not an option index", token))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        Self::from_indices(indices)
    }
}

impl Serialize for AnswerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AnswerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; OPTION_COUNT] {
        ["Red".into(), "Green".into(), "Blue".into(), "Yellow".into()]
    }

    #[test]
    fn answer_key_normalizes_padded_and_unordered_input() {
        let key: AnswerKey = "03, 01,3".parse().expect("key should parse");
        assert_eq!(key.indices(), vec![1, 3]);
        assert_eq!(key.to_string(), "1,3");
    }

    #[test]
    fn answer_key_treats_zero_as_unanswered() {
        let key: AnswerKey = "0".parse().expect("sentinel should parse");
        assert!(key.is_empty());
        assert_eq!(key.first_or_sentinel(), 0);
    }

    #[test]
    fn answer_key_rejects_out_of_range_and_garbage() {
        assert!("5".parse::<AnswerKey>().is_err());
        assert!("-1".parse::<AnswerKey>().is_err());
        assert!("b".parse::<AnswerKey>().is_err());
    }

    #[test]
    fn answer_key_is_stored_comma_joined() {
        let key = AnswerKey::from_indices([3, 1]).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"1,3\"");

        let parsed: AnswerKey = serde_json::from_str("\"1,3\"").unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn question_type_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&QuestionType::Multiple).unwrap(),
            "\"multiple\""
        );
        assert!(serde_json::from_str::<QuestionType>("\"essay\"").is_err());
    }

    #[test]
    fn single_question_requires_exactly_one_correct_option() {
        let key = AnswerKey::from_indices([1, 2]).unwrap();
        let result = Question::new("quiz-1", "Pick one", options(), QuestionType::Single, key, 1, 0);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn question_rejects_blank_option_and_bad_marks() {
        let mut opts = options();
        opts[2] = "  ".into();
        let key = AnswerKey::single(1).unwrap();
        assert!(Question::new("quiz-1", "Q", opts, QuestionType::Single, key.clone(), 1, 0).is_err());
        assert!(Question::new("quiz-1", "Q", options(), QuestionType::Single, key.clone(), 0, 0).is_err());
        assert!(Question::new("quiz-1", "Q", options(), QuestionType::Single, key, 1, -1).is_err());
    }

    #[test]
    fn multiple_question_accepts_set_of_indices() {
        let key = AnswerKey::from_indices([1, 3]).unwrap();
        let question =
            Question::new("quiz-1", "Primary colours?", options(), QuestionType::Multiple, key, 2, 0)
                .expect("question should be valid");
        assert_eq!(question.correct_answer.len(), 2);
    }
}
