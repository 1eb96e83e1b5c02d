//! Transactional removal of a catalog node together with everything below it.
//!
//! subject → chapters → quizzes → questions, attempts and answer rows.

use mongodb::{
    bson::{doc, Bson, Document},
    ClientSession, Collection,
};

use crate::{
    db::{self, Database},
    errors::AppResult,
};

pub struct CascadeDelete {
    db: Database,
    subjects: Collection<Document>,
    chapters: Collection<Document>,
    quizzes: Collection<Document>,
    questions: Collection<Document>,
    attempts: Collection<Document>,
    answers: Collection<Document>,
}

impl CascadeDelete {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            subjects: db.get_collection(db::SUBJECTS),
            chapters: db.get_collection(db::CHAPTERS),
            quizzes: db.get_collection(db::QUIZZES),
            questions: db.get_collection(db::QUESTIONS),
            attempts: db.get_collection(db::QUIZ_ATTEMPTS),
            answers: db.get_collection(db::USER_ANSWERS),
        }
    }

    /// Returns `false` when no subject with that id existed.
    pub async fn subject(&self, subject_id: &str) -> AppResult<bool> {
        let mut session = self.db.begin_transaction().await?;
        let result = self.subject_tree(subject_id, &mut session).await;
        Database::finish_transaction(session, result).await
    }

    pub async fn chapter(&self, chapter_id: &str) -> AppResult<bool> {
        let mut session = self.db.begin_transaction().await?;
        let result = self
            .chapter_trees(vec![Bson::String(chapter_id.to_string())], &mut session)
            .await;
        Database::finish_transaction(session, result).await
    }

    pub async fn quiz(&self, quiz_id: &str) -> AppResult<bool> {
        let mut session = self.db.begin_transaction().await?;
        let result = self
            .quiz_trees(vec![Bson::String(quiz_id.to_string())], &mut session)
            .await;
        Database::finish_transaction(session, result).await
    }

    /// A question takes its answer rows with it. Attempt totals stay as
    /// they were scored.
    pub async fn question(&self, question_id: &str) -> AppResult<bool> {
        let mut session = self.db.begin_transaction().await?;
        let result = self.question_tree(question_id, &mut session).await;
        Database::finish_transaction(session, result).await
    }

    async fn question_tree(
        &self,
        question_id: &str,
        session: &mut ClientSession,
    ) -> AppResult<bool> {
        self.answers
            .delete_many(doc! { "question_id": question_id })
            .session(&mut *session)
            .await?;
        let deleted = self
            .questions
            .delete_one(doc! { "id": question_id })
            .session(&mut *session)
            .await?;
        Ok(deleted.deleted_count > 0)
    }

    async fn subject_tree(&self, subject_id: &str, session: &mut ClientSession) -> AppResult<bool> {
        let chapter_ids = self
            .chapters
            .distinct("id", doc! { "subject_id": subject_id })
            .session(&mut *session)
            .await?;
        self.chapter_trees(chapter_ids, session).await?;

        let deleted = self
            .subjects
            .delete_one(doc! { "id": subject_id })
            .session(&mut *session)
            .await?;
        Ok(deleted.deleted_count > 0)
    }

    async fn chapter_trees(
        &self,
        chapter_ids: Vec<Bson>,
        session: &mut ClientSession,
    ) -> AppResult<bool> {
        if chapter_ids.is_empty() {
            return Ok(false);
        }

        let quiz_ids = self
            .quizzes
            .distinct("id", doc! { "chapter_id": { "$in": chapter_ids.clone() } })
            .session(&mut *session)
            .await?;
        self.quiz_trees(quiz_ids, session).await?;

        let deleted = self
            .chapters
            .delete_many(doc! { "id": { "$in": chapter_ids } })
            .session(&mut *session)
            .await?;
        Ok(deleted.deleted_count > 0)
    }

    async fn quiz_trees(&self, quiz_ids: Vec<Bson>, session: &mut ClientSession) -> AppResult<bool> {
        if quiz_ids.is_empty() {
            return Ok(false);
        }

        let by_quiz = doc! { "quiz_id": { "$in": quiz_ids.clone() } };
        self.answers
            .delete_many(by_quiz.clone())
            .session(&mut *session)
            .await?;
        self.attempts
            .delete_many(by_quiz.clone())
            .session(&mut *session)
            .await?;
        self.questions
            .delete_many(by_quiz)
            .session(&mut *session)
            .await?;

        let deleted = self
            .quizzes
            .delete_many(doc! { "id": { "$in": quiz_ids } })
            .session(&mut *session)
            .await?;

        log::debug!("Cascade removed {} quizzes", deleted.deleted_count);
        Ok(deleted.deleted_count > 0)
    }
}
