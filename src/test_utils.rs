use crate::models::domain::{AnswerKey, Chapter, Question, QuestionType, Quiz, Subject, User};

pub mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    /// Creates a standard test user
    pub fn test_user() -> User {
        User::test_user("test@example.com")
    }

    /// Creates multiple test users for testing collections
    pub fn test_users() -> Vec<User> {
        vec![
            User::new("john@example.com", "John Doe", None, None, "hash".into()),
            User::new("jane@example.com", "Jane Smith", None, None, "hash".into()),
            User::new("alice@example.com", "Alice Wonder", None, None, "hash".into()),
        ]
    }

    /// Subject > chapter > active quiz, ready to receive questions.
    pub fn quiz_tree() -> (Subject, Chapter, Quiz) {
        let subject = Subject::new("Mathematics", None);
        let chapter = Chapter::new(&subject.id, "Arithmetic", None);
        let quiz = Quiz::new(
            &chapter.id,
            "Number sense",
            None,
            15,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        (subject, chapter, quiz)
    }

    fn options() -> [String; 4] {
        ["one".into(), "two".into(), "three".into(), "four".into()]
    }

    pub fn single_question(quiz_id: &str, correct: u8) -> Question {
        Question::new(
            quiz_id,
            "Pick one",
            options(),
            QuestionType::Single,
            AnswerKey::single(correct).unwrap(),
            1,
            0,
        )
        .unwrap()
    }

    pub fn multiple_question(quiz_id: &str, correct: &[u8]) -> Question {
        Question::new(
            quiz_id,
            "Pick all that apply",
            options(),
            QuestionType::Multiple,
            AnswerKey::from_indices(correct.iter().map(|&i| i as i64)).unwrap(),
            1,
            0,
        )
        .unwrap()
    }
}

pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

/// Repositories backed by shared vectors, for unit tests that need storage
/// without a MongoDB server.
pub mod memory {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::sync::RwLock;

    use crate::{
        app_state::Repositories,
        errors::{AppError, AppResult},
        jobs::{JobRunner, Mailer, RetryPolicy},
        models::domain::{
            Chapter, Question, Quiz, QuizAttempt, RefreshToken, Subject, User, UserAnswer,
            UserRole,
        },
        repositories::{
            ChapterRepository, QuestionRepository, QuizAttemptRepository, QuizRepository,
            RefreshTokenRepository, SubjectRepository, UserRepository,
        },
        services::statistics::PerformanceLadder,
    };

    type Table<T> = Arc<RwLock<Vec<T>>>;

    #[derive(Clone, Default)]
    pub struct MemoryStore {
        pub users: Table<User>,
        pub subjects: Table<Subject>,
        pub chapters: Table<Chapter>,
        pub quizzes: Table<Quiz>,
        pub questions: Table<Question>,
        pub attempts: Table<QuizAttempt>,
        pub answers: Table<UserAnswer>,
        pub refresh_tokens: Table<RefreshToken>,
        /// When set, `record_submission` fails before touching any table.
        pub fail_writes: Arc<RwLock<bool>>,
    }

    impl MemoryStore {
        pub async fn add_user(&self, user: User) {
            self.users.write().await.push(user);
        }

        pub async fn add_subject(&self, subject: Subject) {
            self.subjects.write().await.push(subject);
        }

        pub async fn add_chapter(&self, chapter: Chapter) {
            self.chapters.write().await.push(chapter);
        }

        pub async fn add_quiz(&self, quiz: Quiz) {
            self.quizzes.write().await.push(quiz);
        }

        pub async fn add_question(&self, question: Question) {
            self.questions.write().await.push(question);
        }

        pub async fn add_attempt(&self, attempt: QuizAttempt) {
            self.attempts.write().await.push(attempt);
        }

        pub fn repositories(&self) -> Repositories {
            Repositories {
                users: Arc::new(self.clone()),
                refresh_tokens: Arc::new(self.clone()),
                subjects: Arc::new(self.clone()),
                chapters: Arc::new(self.clone()),
                quizzes: Arc::new(self.clone()),
                questions: Arc::new(self.clone()),
                attempts: Arc::new(self.clone()),
            }
        }

        pub fn runner(&self, mailer: impl Mailer + 'static) -> JobRunner {
            JobRunner {
                users: Arc::new(self.clone()),
                subjects: Arc::new(self.clone()),
                chapters: Arc::new(self.clone()),
                quizzes: Arc::new(self.clone()),
                attempts: Arc::new(self.clone()),
                mailer: Arc::new(mailer),
                ladder: PerformanceLadder::default(),
                retry: RetryPolicy {
                    max_retries: 2,
                    base_delay: Duration::from_millis(1),
                },
            }
        }
    }

    fn replace<T: Clone>(rows: &mut [T], item: T, same: impl Fn(&T) -> bool) -> AppResult<T> {
        let slot = rows
            .iter_mut()
            .find(|row| same(row))
            .ok_or_else(|| AppError::NotFound("Record not found".into()))?;
        *slot = item.clone();
        Ok(item)
    }

    fn newest_first(mut attempts: Vec<QuizAttempt>) -> Vec<QuizAttempt> {
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        attempts
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn create(&self, user: User) -> AppResult<User> {
            let mut users = self.users.write().await;
            if users.iter().any(|u| u.email == user.email) {
                return Err(AppError::AlreadyExists(format!(
                    "Email {} already registered",
                    user.email
                )));
            }
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
            Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            let email = email.trim().to_lowercase();
            Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_role(&self, role: UserRole) -> AppResult<Vec<User>> {
            Ok(self
                .users
                .read()
                .await
                .iter()
                .filter(|u| u.role == role)
                .cloned()
                .collect())
        }

        async fn find_by_role_paginated(
            &self,
            role: UserRole,
            offset: i64,
            limit: i64,
        ) -> AppResult<(Vec<User>, i64)> {
            let all = UserRepository::find_by_role(self, role).await?;
            let total = all.len() as i64;
            let page = all
                .into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect();
            Ok((page, total))
        }

        async fn update(&self, user: User) -> AppResult<User> {
            let id = user.id.clone();
            replace(&mut self.users.write().await, user, |u| u.id == id)
        }

        async fn count_by_role(&self, role: UserRole) -> AppResult<u64> {
            Ok(UserRepository::find_by_role(self, role).await?.len() as u64)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl SubjectRepository for MemoryStore {
        async fn create(&self, subject: Subject) -> AppResult<Subject> {
            self.subjects.write().await.push(subject.clone());
            Ok(subject)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<Subject>> {
            Ok(self.subjects.read().await.iter().find(|s| s.id == id).cloned())
        }

        async fn find_by_name(&self, name: &str) -> AppResult<Option<Subject>> {
            let name = name.trim();
            Ok(self.subjects.read().await.iter().find(|s| s.name == name).cloned())
        }

        async fn find_all(&self) -> AppResult<Vec<Subject>> {
            let mut subjects = self.subjects.read().await.clone();
            subjects.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(subjects)
        }

        async fn update(&self, subject: Subject) -> AppResult<Subject> {
            let id = subject.id.clone();
            replace(&mut self.subjects.write().await, subject, |s| s.id == id)
        }

        async fn delete(&self, id: &str) -> AppResult<()> {
            let chapter_ids: Vec<String> = self
                .chapters
                .read()
                .await
                .iter()
                .filter(|c| c.subject_id == id)
                .map(|c| c.id.clone())
                .collect();
            for chapter_id in &chapter_ids {
                ChapterRepository::delete(self, chapter_id).await?;
            }
            self.subjects.write().await.retain(|s| s.id != id);
            Ok(())
        }

        async fn count(&self) -> AppResult<u64> {
            Ok(self.subjects.read().await.len() as u64)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChapterRepository for MemoryStore {
        async fn create(&self, chapter: Chapter) -> AppResult<Chapter> {
            self.chapters.write().await.push(chapter.clone());
            Ok(chapter)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<Chapter>> {
            Ok(self.chapters.read().await.iter().find(|c| c.id == id).cloned())
        }

        async fn find_all(&self) -> AppResult<Vec<Chapter>> {
            Ok(self.chapters.read().await.clone())
        }

        async fn find_by_subject(&self, subject_id: &str) -> AppResult<Vec<Chapter>> {
            Ok(self
                .chapters
                .read()
                .await
                .iter()
                .filter(|c| c.subject_id == subject_id)
                .cloned()
                .collect())
        }

        async fn update(&self, chapter: Chapter) -> AppResult<Chapter> {
            let id = chapter.id.clone();
            replace(&mut self.chapters.write().await, chapter, |c| c.id == id)
        }

        async fn delete(&self, id: &str) -> AppResult<()> {
            let quiz_ids: Vec<String> = self
                .quizzes
                .read()
                .await
                .iter()
                .filter(|q| q.chapter_id == id)
                .map(|q| q.id.clone())
                .collect();
            for quiz_id in &quiz_ids {
                QuizRepository::delete(self, quiz_id).await?;
            }
            self.chapters.write().await.retain(|c| c.id != id);
            Ok(())
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl QuizRepository for MemoryStore {
        async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
            self.quizzes.write().await.push(quiz.clone());
            Ok(quiz)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
            Ok(self.quizzes.read().await.iter().find(|q| q.id == id).cloned())
        }

        async fn find_all(&self) -> AppResult<Vec<Quiz>> {
            Ok(self.quizzes.read().await.clone())
        }

        async fn find_active(&self) -> AppResult<Vec<Quiz>> {
            Ok(self
                .quizzes
                .read()
                .await
                .iter()
                .filter(|q| q.is_active)
                .cloned()
                .collect())
        }

        async fn find_by_chapter(&self, chapter_id: &str) -> AppResult<Vec<Quiz>> {
            Ok(self
                .quizzes
                .read()
                .await
                .iter()
                .filter(|q| q.chapter_id == chapter_id)
                .cloned()
                .collect())
        }

        async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
            let id = quiz.id.clone();
            replace(&mut self.quizzes.write().await, quiz, |q| q.id == id)
        }

        async fn delete(&self, id: &str) -> AppResult<()> {
            self.quizzes.write().await.retain(|q| q.id != id);
            self.questions.write().await.retain(|q| q.quiz_id != id);
            self.attempts.write().await.retain(|a| a.quiz_id != id);
            self.answers.write().await.retain(|a| a.quiz_id != id);
            Ok(())
        }

        async fn count(&self) -> AppResult<u64> {
            Ok(self.quizzes.read().await.len() as u64)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl QuestionRepository for MemoryStore {
        async fn create(&self, question: Question) -> AppResult<Question> {
            self.questions.write().await.push(question.clone());
            Ok(question)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
            Ok(self.questions.read().await.iter().find(|q| q.id == id).cloned())
        }

        async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Question>> {
            Ok(self
                .questions
                .read()
                .await
                .iter()
                .filter(|q| q.quiz_id == quiz_id)
                .cloned()
                .collect())
        }

        async fn update(&self, question: Question) -> AppResult<Question> {
            let id = question.id.clone();
            replace(&mut self.questions.write().await, question, |q| q.id == id)
        }

        async fn delete(&self, id: &str) -> AppResult<()> {
            self.questions.write().await.retain(|q| q.id != id);
            self.answers.write().await.retain(|a| a.question_id != id);
            Ok(())
        }

        async fn count_by_quiz(&self, quiz_id: &str) -> AppResult<u64> {
            Ok(QuestionRepository::find_by_quiz(self, quiz_id).await?.len() as u64)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl QuizAttemptRepository for MemoryStore {
        async fn record_submission(
            &self,
            attempt: QuizAttempt,
            answers: Vec<UserAnswer>,
        ) -> AppResult<QuizAttempt> {
            if *self.fail_writes.read().await {
                return Err(AppError::DatabaseError("write rejected".to_string()));
            }
            let mut stored = self.answers.write().await;
            stored.retain(|a| !(a.user_id == attempt.user_id && a.quiz_id == attempt.quiz_id));
            stored.extend(answers);
            self.attempts.write().await.push(attempt.clone());
            Ok(attempt)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
            Ok(self.attempts.read().await.iter().find(|a| a.id == id).cloned())
        }

        async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
            let attempts = self.attempts.read().await;
            Ok(newest_first(
                attempts.iter().filter(|a| a.user_id == user_id).cloned().collect(),
            ))
        }

        async fn find_by_user_and_quiz(
            &self,
            user_id: &str,
            quiz_id: &str,
        ) -> AppResult<Vec<QuizAttempt>> {
            let attempts = self.attempts.read().await;
            Ok(newest_first(
                attempts
                    .iter()
                    .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
                    .cloned()
                    .collect(),
            ))
        }

        async fn find_answers(&self, user_id: &str, quiz_id: &str) -> AppResult<Vec<UserAnswer>> {
            Ok(self
                .answers
                .read()
                .await
                .iter()
                .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
                .cloned()
                .collect())
        }

        async fn has_user_attempted_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool> {
            Ok(self
                .attempts
                .read()
                .await
                .iter()
                .any(|a| a.user_id == user_id && a.quiz_id == quiz_id))
        }

        async fn find_since(&self, since: DateTime<Utc>) -> AppResult<Vec<QuizAttempt>> {
            let attempts = self.attempts.read().await;
            Ok(newest_first(
                attempts.iter().filter(|a| a.submitted_at >= since).cloned().collect(),
            ))
        }

        async fn count(&self) -> AppResult<u64> {
            Ok(self.attempts.read().await.len() as u64)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl RefreshTokenRepository for MemoryStore {
        async fn create(&self, token: RefreshToken) -> AppResult<RefreshToken> {
            self.refresh_tokens.write().await.push(token.clone());
            Ok(token)
        }

        async fn find_by_token_hash(&self, hash: &str) -> AppResult<Option<RefreshToken>> {
            Ok(self
                .refresh_tokens
                .read()
                .await
                .iter()
                .find(|t| t.token_hash == hash)
                .cloned())
        }

        async fn revoke_by_token_hash(&self, hash: &str) -> AppResult<()> {
            for token in self.refresh_tokens.write().await.iter_mut() {
                if token.token_hash == hash {
                    token.revoked = true;
                }
            }
            Ok(())
        }

        async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
            let mut revoked = 0;
            for token in self.refresh_tokens.write().await.iter_mut() {
                if token.user_id == user_id && !token.revoked {
                    token.revoked = true;
                    revoked += 1;
                }
            }
            Ok(revoked)
        }

        async fn ensure_indexes(&self) -> AppResult<()> {
            Ok(())
        }
    }
}

pub mod mail {
    use std::{collections::HashMap, sync::Arc};

    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use crate::{
        errors::{AppError, AppResult},
        jobs::{Email, Mailer},
    };

    /// Keeps every delivered email. Clones share the same outbox.
    #[derive(Clone, Default)]
    pub struct RecordingMailer {
        pub sent: Arc<RwLock<Vec<Email>>>,
        failures: Arc<RwLock<HashMap<String, u32>>>,
    }

    impl RecordingMailer {
        /// The next `times` sends to `to` fail.
        pub async fn fail_next(&self, to: &str, times: u32) {
            self.failures.write().await.insert(to.to_string(), times);
        }

        pub async fn sent_to(&self, to: &str) -> usize {
            self.sent.read().await.iter().filter(|e| e.to == to).count()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: Email) -> AppResult<()> {
            if let Some(left) = self.failures.write().await.get_mut(&email.to) {
                if *left > 0 {
                    *left -= 1;
                    return Err(AppError::InternalError(format!(
                        "SMTP refused {}",
                        email.to
                    )));
                }
            }
            self.sent.write().await.push(email);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, memory::MemoryStore};
    use crate::{
        models::domain::{QuizAttempt, UserRole},
        repositories::{QuizAttemptRepository, UserRepository},
    };
    use chrono::Utc;

    #[test]
    fn test_fixtures_test_users() {
        let users = test_users();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].email, "john@example.com");
        assert!(users.iter().all(|u| u.role == UserRole::User));
    }

    #[test]
    fn test_quiz_tree_is_linked() {
        let (subject, chapter, quiz) = quiz_tree();
        assert_eq!(chapter.subject_id, subject.id);
        assert_eq!(quiz.chapter_id, chapter.id);
        assert!(quiz.is_active);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_email() {
        let store = MemoryStore::default();
        UserRepository::create(&store, test_user()).await.unwrap();
        assert!(UserRepository::create(&store, test_user()).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_replaces_answers_on_resubmission() {
        let store = MemoryStore::default();
        let (_, _, quiz) = quiz_tree();
        let attempt = QuizAttempt::new("u1", &quiz.id, 0, 1, 10, Utc::now());
        store.record_submission(attempt.clone(), vec![]).await.unwrap();
        store
            .record_submission(QuizAttempt::new("u1", &quiz.id, 1, 1, 10, Utc::now()), vec![])
            .await
            .unwrap();

        assert_eq!(store.find_by_user("u1").await.unwrap().len(), 2);
        assert!(store.has_user_attempted_quiz("u1", &quiz.id).await.unwrap());
    }
}
