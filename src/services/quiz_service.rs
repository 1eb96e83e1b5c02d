use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Question, Quiz},
        dto::{
            quiz_dto::{QuestionDto, QuestionForTaking, QuizForTaking, QuizSummaryDto},
            request::{parse_date, CreateQuizRequest, QuestionRequest, UpdateQuizRequest},
        },
    },
    repositories::{
        ChapterRepository, QuestionRepository, QuizAttemptRepository, QuizRepository,
        SubjectRepository,
    },
};

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    chapters: Arc<dyn ChapterRepository>,
    subjects: Arc<dyn SubjectRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        chapters: Arc<dyn ChapterRepository>,
        subjects: Arc<dyn SubjectRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        Self {
            quizzes,
            questions,
            chapters,
            subjects,
            attempts,
        }
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with id '{}' not found", id)))
    }

    /// Every quiz, active or not, with chapter/subject names and question count.
    pub async fn list_quizzes(&self) -> AppResult<Vec<QuizSummaryDto>> {
        let quizzes = self.quizzes.find_all().await?;
        self.summarize(quizzes).await
    }

    /// Active quizzes flagged with whether `user_id` has attempted them.
    pub async fn available_quizzes(&self, user_id: &str) -> AppResult<Vec<QuizSummaryDto>> {
        let attempted: HashSet<String> = self
            .attempts
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(|attempt| attempt.quiz_id)
            .collect();

        let quizzes = self.quizzes.find_active().await?;
        Ok(self
            .summarize(quizzes)
            .await?
            .into_iter()
            .map(|mut dto| {
                dto.user_has_attempted = Some(attempted.contains(&dto.id));
                dto
            })
            .collect())
    }

    /// Quiz metadata and questions without answers, plus the start timestamp
    /// the client hands back on submit.
    pub async fn start_quiz(&self, quiz_id: &str) -> AppResult<QuizForTaking> {
        let quiz = self.get_quiz(quiz_id).await?;
        if !quiz.is_active {
            return Err(AppError::BadRequest(
                "Quiz is not available for taking".to_string(),
            ));
        }

        let questions = self.questions.find_by_quiz(quiz_id).await?;
        if questions.is_empty() {
            return Err(AppError::BadRequest("Quiz has no questions".to_string()));
        }

        let count = questions.len() as i64;
        Ok(QuizForTaking {
            quiz: QuizSummaryDto::from_quiz(quiz, count),
            questions: questions.into_iter().map(QuestionForTaking::from).collect(),
            start_time: Utc::now(),
        })
    }

    pub async fn create_quiz(&self, request: CreateQuizRequest) -> AppResult<Quiz> {
        request.validate()?;
        self.ensure_chapter_exists(&request.chapter_id).await?;
        let date_of_quiz = parse_date(&request.date_of_quiz, "date")?;

        let quiz = Quiz::new(
            &request.chapter_id,
            request.title.trim(),
            request.description,
            request.duration_minutes,
            date_of_quiz,
        );
        let quiz = self.quizzes.create(quiz).await?;

        log::info!("Created quiz {} ({})", quiz.title, quiz.id);
        Ok(quiz)
    }

    pub async fn update_quiz(&self, id: &str, request: UpdateQuizRequest) -> AppResult<Quiz> {
        request.validate()?;
        let mut quiz = self.get_quiz(id).await?;

        if let Some(chapter_id) = request.chapter_id {
            self.ensure_chapter_exists(&chapter_id).await?;
            quiz.chapter_id = chapter_id;
        }
        if let Some(title) = request.title {
            quiz.title = title.trim().to_string();
        }
        if request.description.is_some() {
            quiz.description = request.description;
        }
        if let Some(duration) = request.duration_minutes {
            quiz.duration_minutes = duration;
        }
        if let Some(date) = request.date_of_quiz {
            quiz.date_of_quiz = parse_date(&date, "date")?;
        }
        if let Some(is_active) = request.is_active {
            if quiz.is_active != is_active {
                log::info!("Quiz {} active flag set to {}", id, is_active);
            }
            quiz.is_active = is_active;
        }
        quiz.modified_at = Some(Utc::now());

        self.quizzes.update(quiz).await
    }

    pub async fn delete_quiz(&self, id: &str) -> AppResult<()> {
        self.quizzes.delete(id).await?;
        log::info!("Deleted quiz {} with its questions and results", id);
        Ok(())
    }

    pub async fn list_questions(&self, quiz_id: &str) -> AppResult<Vec<QuestionDto>> {
        self.get_quiz(quiz_id).await?;
        let questions = self.questions.find_by_quiz(quiz_id).await?;
        Ok(questions.into_iter().map(QuestionDto::from).collect())
    }

    pub async fn create_question(
        &self,
        quiz_id: &str,
        request: QuestionRequest,
    ) -> AppResult<QuestionDto> {
        request.validate()?;
        self.get_quiz(quiz_id).await?;

        let question = Question::new(
            quiz_id,
            request.statement.trim(),
            request.option_array()?,
            request.question_type,
            request.answer_key()?,
            request.marks,
            request.negative_marks,
        )?;
        let question = self.questions.create(question).await?;

        log::debug!("Added question {} to quiz {}", question.id, quiz_id);
        Ok(question.into())
    }

    pub async fn update_question(&self, id: &str, request: QuestionRequest) -> AppResult<QuestionDto> {
        request.validate()?;
        let mut question = self
            .questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", id)))?;

        question.statement = request.statement.trim().to_string();
        question.options = request.option_array()?;
        question.question_type = request.question_type;
        question.correct_answer = request.answer_key()?;
        question.marks = request.marks;
        question.negative_marks = request.negative_marks;
        question.modified_at = Some(Utc::now());
        question.validate()?;

        Ok(self.questions.update(question).await?.into())
    }

    pub async fn delete_question(&self, id: &str) -> AppResult<()> {
        self.questions.delete(id).await
    }

    async fn ensure_chapter_exists(&self, chapter_id: &str) -> AppResult<()> {
        self.chapters
            .find_by_id(chapter_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Chapter '{}' not found", chapter_id)))
    }

    async fn summarize(&self, quizzes: Vec<Quiz>) -> AppResult<Vec<QuizSummaryDto>> {
        let chapters: HashMap<String, (String, String)> = self
            .chapters
            .find_all()
            .await?
            .into_iter()
            .map(|c| (c.id, (c.name, c.subject_id)))
            .collect();
        let subjects: HashMap<String, String> = self
            .subjects
            .find_all()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        let mut summaries = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let count = self.questions.count_by_quiz(&quiz.id).await? as i64;
            let (chapter_name, subject_name) = match chapters.get(&quiz.chapter_id) {
                Some((name, subject_id)) => (Some(name.clone()), subjects.get(subject_id).cloned()),
                None => (None, None),
            };
            summaries.push(QuizSummaryDto::from_quiz(quiz, count).with_names(chapter_name, subject_name));
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{question::QuestionType, QuizAttempt};
    use crate::test_utils::{fixtures, memory::MemoryStore};

    fn service(store: &MemoryStore) -> QuizService {
        QuizService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
    }

    async fn seeded() -> (MemoryStore, Quiz) {
        let store = MemoryStore::default();
        let (subject, chapter, quiz) = fixtures::quiz_tree();
        store.add_subject(subject).await;
        store.add_chapter(chapter).await;
        store.add_quiz(quiz.clone()).await;
        (store, quiz)
    }

    fn question_request(question_type: QuestionType, correct: &str) -> QuestionRequest {
        QuestionRequest {
            statement: "Which are prime?".to_string(),
            options: vec!["2".into(), "4".into(), "5".into(), "9".into()],
            question_type,
            correct_answer: correct.to_string(),
            marks: 1,
            negative_marks: 0,
        }
    }

    #[tokio::test]
    async fn test_create_quiz_validates_chapter_and_date() {
        let (store, quiz) = seeded().await;
        let quizzes = service(&store);
        let mut request = CreateQuizRequest {
            chapter_id: quiz.chapter_id.clone(),
            title: " Fractions ".to_string(),
            description: None,
            duration_minutes: 20,
            date_of_quiz: "2024-06-01".to_string(),
        };

        let created = quizzes.create_quiz(request.clone()).await.unwrap();
        assert_eq!(created.title, "Fractions");
        assert!(created.is_active);

        request.date_of_quiz = "June 1st".to_string();
        assert!(matches!(
            quizzes.create_quiz(request.clone()).await.unwrap_err(),
            AppError::ValidationError(_)
        ));

        request.date_of_quiz = "2024-06-01".to_string();
        request.chapter_id = "missing".to_string();
        assert!(matches!(
            quizzes.create_quiz(request).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_question_answer_key_matches_type() {
        let (store, quiz) = seeded().await;
        let quizzes = service(&store);

        let created = quizzes
            .create_question(&quiz.id, question_request(QuestionType::Multiple, "1,3"))
            .await
            .unwrap();
        assert_eq!(created.correct_answers, vec![1, 3]);

        let err = quizzes
            .create_question(&quiz.id, question_request(QuestionType::Single, "1,3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = quizzes
            .create_question(&quiz.id, question_request(QuestionType::Single, "5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_start_quiz_requires_active_quiz_with_questions() {
        let (store, quiz) = seeded().await;
        let quizzes = service(&store);

        assert!(matches!(
            quizzes.start_quiz(&quiz.id).await.unwrap_err(),
            AppError::BadRequest(_)
        ));

        store.add_question(fixtures::single_question(&quiz.id, 2)).await;
        let taking = quizzes.start_quiz(&quiz.id).await.unwrap();
        assert_eq!(taking.questions.len(), 1);
        assert_eq!(taking.quiz.questions_count, 1);

        quizzes
            .update_quiz(
                &quiz.id,
                UpdateQuizRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            quizzes.start_quiz(&quiz.id).await.unwrap_err(),
            AppError::BadRequest(_)
        ));

        assert!(matches!(
            quizzes.start_quiz("missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_available_quizzes_flags_attempts() {
        let (store, quiz) = seeded().await;
        let user = fixtures::test_user();
        store
            .add_attempt(QuizAttempt::new(&user.id, &quiz.id, 1, 1, 30, Utc::now()))
            .await;

        let available = service(&store).available_quizzes(&user.id).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].user_has_attempted, Some(true));
        assert_eq!(available[0].subject_name.as_deref(), Some("Mathematics"));

        let fresh = service(&store).available_quizzes("someone-else").await.unwrap();
        assert_eq!(fresh[0].user_has_attempted, Some(false));
    }

    #[tokio::test]
    async fn test_delete_quiz_removes_questions() {
        let (store, quiz) = seeded().await;
        store.add_question(fixtures::single_question(&quiz.id, 1)).await;

        service(&store).delete_quiz(&quiz.id).await.unwrap();

        assert!(store.quizzes.read().await.is_empty());
        assert!(store.questions.read().await.is_empty());
    }
}
