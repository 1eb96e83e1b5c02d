use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Question, QuestionType, QuizAttempt, Selection, UserAnswer},
        dto::{
            quiz_dto::{AttemptDto, QuestionReview, ScoreDetails, SubmissionResult},
            request::{SubmitQuizRequest, SubmittedResponse},
        },
    },
    repositories::{QuestionRepository, QuizAttemptRepository, QuizRepository},
    services::statistics::PerformanceLadder,
};

/// Outcome of grading one question.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedQuestion {
    pub question: Question,
    pub selection: Selection,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedAttempt {
    pub total_scored: i32,
    pub total_questions: i32,
    pub questions: Vec<GradedQuestion>,
}

pub struct QuizAttemptService {
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    ladder: PerformanceLadder,
}

impl QuizAttemptService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        ladder: PerformanceLadder,
    ) -> Self {
        Self {
            quizzes,
            questions,
            attempts,
            ladder,
        }
    }

    /// Grade an individual question. Unanswered is simply wrong.
    pub fn grade_question(question: &Question, selection: &Selection) -> bool {
        if selection.is_empty() {
            return false;
        }
        match question.question_type {
            // exactly one index, and it is the stored one
            QuestionType::Single => selection.len() == 1 && *selection == question.correct_answer,
            // same set; order and duplicates were normalized away on parse
            QuestionType::Multiple => *selection == question.correct_answer,
        }
    }

    /// Grade every question of the quiz against the responses keyed by
    /// question id. Keys that match no question are ignored.
    pub fn grade_attempt(
        questions: &[Question],
        responses: &HashMap<String, Selection>,
    ) -> GradedAttempt {
        let graded: Vec<GradedQuestion> = questions
            .iter()
            .map(|question| {
                let selection = responses.get(&question.id).cloned().unwrap_or_default();
                GradedQuestion {
                    is_correct: Self::grade_question(question, &selection),
                    question: question.clone(),
                    selection,
                }
            })
            .collect();

        GradedAttempt {
            total_scored: graded.iter().filter(|g| g.is_correct).count() as i32,
            total_questions: graded.len() as i32,
            questions: graded,
        }
    }

    /// Normalize the wire responses. Any malformed value rejects the whole
    /// submission.
    pub fn parse_responses(
        answers: &HashMap<String, Option<SubmittedResponse>>,
    ) -> AppResult<HashMap<String, Selection>> {
        answers
            .iter()
            .map(|(question_id, response)| {
                let selection = match response {
                    Some(response) => response.to_selection().map_err(|e| {
                        AppError::ValidationError(format!(
                            "Invalid answer for question {}: {}",
                            question_id, e
                        ))
                    })?,
                    None => Selection::unanswered(),
                };
                Ok((question_id.clone(), selection))
            })
            .collect()
    }

    /// Whole seconds between the client's start timestamp and `now`.
    /// Missing or in-the-future start times count as 0.
    pub fn time_taken_seconds(start_time: Option<&str>, now: DateTime<Utc>) -> AppResult<i64> {
        let Some(raw) = start_time.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(0);
        };

        let started = DateTime::parse_from_rfc3339(raw)
            .map_err(|_| {
                AppError::ValidationError(format!("Invalid start_time '{}'; expected RFC 3339", raw))
            })?
            .with_timezone(&Utc);

        Ok((now - started).num_seconds().max(0))
    }

    pub async fn submit(
        &self,
        user_id: &str,
        quiz_id: &str,
        request: SubmitQuizRequest,
    ) -> AppResult<SubmissionResult> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz '{}' not found", quiz_id)))?;

        if !quiz.is_active {
            return Err(AppError::BadRequest(
                "Quiz is not available for taking".to_string(),
            ));
        }

        let questions = self.questions.find_by_quiz(quiz_id).await?;
        if questions.is_empty() {
            return Err(AppError::BadRequest("Quiz has no questions".to_string()));
        }

        let responses = Self::parse_responses(&request.answers)?;
        let now = Utc::now();
        let time_taken = Self::time_taken_seconds(request.start_time.as_deref(), now)?;

        let graded = Self::grade_attempt(&questions, &responses);
        let attempt = QuizAttempt::new(
            user_id,
            quiz_id,
            graded.total_scored,
            graded.total_questions,
            time_taken,
            now,
        );
        let answers = answer_rows(&attempt, &graded);

        let attempt = self.attempts.record_submission(attempt, answers).await?;

        log::info!(
            "User {} scored {}/{} on quiz {} in {}s",
            user_id,
            attempt.total_scored,
            attempt.total_questions,
            quiz_id,
            attempt.time_taken_seconds
        );

        let review = graded
            .questions
            .into_iter()
            .map(|g| review_entry(g.question, &g.selection, g.is_correct))
            .collect();

        Ok(SubmissionResult {
            message: "Quiz submitted successfully".to_string(),
            attempt: AttemptDto::new(attempt, Some(quiz.title), &self.ladder),
            review,
        })
    }

    /// The caller's attempts, newest first.
    pub async fn list_scores(&self, user_id: &str) -> AppResult<Vec<AttemptDto>> {
        let attempts = self.attempts.find_by_user(user_id).await?;

        let mut titles: HashMap<String, Option<String>> = HashMap::new();
        let mut scores = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            if !titles.contains_key(&attempt.quiz_id) {
                let title = self
                    .quizzes
                    .find_by_id(&attempt.quiz_id)
                    .await?
                    .map(|quiz| quiz.title);
                titles.insert(attempt.quiz_id.clone(), title);
            }
            let title = titles.get(&attempt.quiz_id).cloned().flatten();
            scores.push(AttemptDto::new(attempt, title, &self.ladder));
        }

        Ok(scores)
    }

    /// One attempt with its per-question review. Only the latest attempt of
    /// a quiz still has answer rows; older ones come back without a review.
    pub async fn score_details(&self, user_id: &str, attempt_id: &str) -> AppResult<ScoreDetails> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .filter(|attempt| attempt.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Score '{}' not found", attempt_id)))?;

        let answers = self
            .attempts
            .find_answers(user_id, &attempt.quiz_id)
            .await?;
        let review_available =
            !answers.is_empty() && answers.iter().all(|a| a.attempt_id == attempt.id);

        let results = if review_available {
            let by_question: HashMap<&str, &UserAnswer> = answers
                .iter()
                .map(|answer| (answer.question_id.as_str(), answer))
                .collect();

            self.questions
                .find_by_quiz(&attempt.quiz_id)
                .await?
                .into_iter()
                .filter_map(|question| {
                    let answer = by_question.get(question.id.as_str())?;
                    let indices = answer.selected_options.iter().map(|&i| i as i64);
                    let selection = Selection::from_indices(indices).unwrap_or_default();
                    Some(review_entry(question, &selection, answer.is_correct))
                })
                .collect()
        } else {
            Vec::new()
        };

        let title = self
            .quizzes
            .find_by_id(&attempt.quiz_id)
            .await?
            .map(|quiz| quiz.title);

        Ok(ScoreDetails {
            attempt: AttemptDto::new(attempt, title, &self.ladder),
            review_available,
            results,
        })
    }
}

fn answer_rows(attempt: &QuizAttempt, graded: &GradedAttempt) -> Vec<UserAnswer> {
    graded
        .questions
        .iter()
        .map(|g| UserAnswer {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt.id.clone(),
            user_id: attempt.user_id.clone(),
            quiz_id: attempt.quiz_id.clone(),
            question_id: g.question.id.clone(),
            selected_options: g.selection.indices(),
            is_correct: g.is_correct,
            answered_at: attempt.submitted_at,
        })
        .collect()
}

fn review_entry(question: Question, selection: &Selection, is_correct: bool) -> QuestionReview {
    let selected_answer = match question.question_type {
        QuestionType::Single => vec![selection.first_or_sentinel()],
        QuestionType::Multiple => selection.indices(),
    };

    QuestionReview {
        question_id: question.id,
        statement: question.statement,
        options: question.options.to_vec(),
        question_type: question.question_type,
        correct_answer: question.correct_answer.indices(),
        selected_answer,
        is_correct,
    }
}
