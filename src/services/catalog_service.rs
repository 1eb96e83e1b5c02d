//! Subjects and chapters.

use std::{collections::HashMap, sync::Arc};

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Chapter, Subject},
        dto::{
            request::{
                CreateChapterRequest, CreateSubjectRequest, UpdateChapterRequest,
                UpdateSubjectRequest,
            },
            response::{ChapterDto, SubjectDto},
        },
    },
    repositories::{ChapterRepository, QuizRepository, SubjectRepository},
};

pub struct CatalogService {
    subjects: Arc<dyn SubjectRepository>,
    chapters: Arc<dyn ChapterRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CatalogService {
    pub fn new(
        subjects: Arc<dyn SubjectRepository>,
        chapters: Arc<dyn ChapterRepository>,
        quizzes: Arc<dyn QuizRepository>,
    ) -> Self {
        Self {
            subjects,
            chapters,
            quizzes,
        }
    }

    pub async fn list_subjects(&self) -> AppResult<Vec<SubjectDto>> {
        let subjects = self.subjects.find_all().await?;
        let quiz_counts = self.quiz_counts_by_chapter().await?;

        let mut result = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let chapters = self.chapters.find_by_subject(&subject.id).await?;
            let quiz_count = chapters
                .iter()
                .map(|c| quiz_counts.get(&c.id).copied().unwrap_or(0))
                .sum();
            result.push(SubjectDto {
                subject,
                chapters_count: chapters.len() as u64,
                quiz_count,
            });
        }
        Ok(result)
    }

    pub async fn create_subject(&self, request: CreateSubjectRequest) -> AppResult<Subject> {
        request.validate()?;
        self.ensure_subject_name_free(&request.name, None).await?;

        let subject = self
            .subjects
            .create(Subject::new(&request.name, request.description))
            .await?;
        log::info!("Created subject {} ({})", subject.name, subject.id);
        Ok(subject)
    }

    pub async fn update_subject(
        &self,
        id: &str,
        request: UpdateSubjectRequest,
    ) -> AppResult<Subject> {
        request.validate()?;
        let mut subject = self.get_subject(id).await?;

        if let Some(name) = request.name {
            self.ensure_subject_name_free(&name, Some(id)).await?;
            subject.name = name.trim().to_string();
        }
        if request.description.is_some() {
            subject.description = request.description;
        }

        self.subjects.update(subject).await
    }

    pub async fn delete_subject(&self, id: &str) -> AppResult<()> {
        self.subjects.delete(id).await?;
        log::info!("Deleted subject {} and its descendants", id);
        Ok(())
    }

    pub async fn get_subject(&self, id: &str) -> AppResult<Subject> {
        self.subjects
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subject '{}' not found", id)))
    }

    pub async fn list_chapters(&self, subject_id: Option<&str>) -> AppResult<Vec<ChapterDto>> {
        let chapters = match subject_id {
            Some(subject_id) => self.chapters.find_by_subject(subject_id).await?,
            None => self.chapters.find_all().await?,
        };
        let subject_names: HashMap<String, String> = self
            .subjects
            .find_all()
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let quiz_counts = self.quiz_counts_by_chapter().await?;

        Ok(chapters
            .into_iter()
            .map(|chapter| ChapterDto {
                subject_name: subject_names.get(&chapter.subject_id).cloned(),
                quizzes_count: quiz_counts.get(&chapter.id).copied().unwrap_or(0),
                chapter,
            })
            .collect())
    }

    pub async fn create_chapter(&self, request: CreateChapterRequest) -> AppResult<Chapter> {
        request.validate()?;
        self.get_subject(&request.subject_id).await?;

        let chapter = self
            .chapters
            .create(Chapter::new(&request.subject_id, &request.name, request.description))
            .await?;
        log::info!("Created chapter {} ({})", chapter.name, chapter.id);
        Ok(chapter)
    }

    pub async fn update_chapter(
        &self,
        id: &str,
        request: UpdateChapterRequest,
    ) -> AppResult<Chapter> {
        request.validate()?;
        let mut chapter = self.get_chapter(id).await?;

        if let Some(subject_id) = request.subject_id {
            self.get_subject(&subject_id).await?;
            chapter.subject_id = subject_id;
        }
        if let Some(name) = request.name {
            chapter.name = name.trim().to_string();
        }
        if request.description.is_some() {
            chapter.description = request.description;
        }

        self.chapters.update(chapter).await
    }

    pub async fn delete_chapter(&self, id: &str) -> AppResult<()> {
        self.chapters.delete(id).await?;
        log::info!("Deleted chapter {} and its descendants", id);
        Ok(())
    }

    pub async fn get_chapter(&self, id: &str) -> AppResult<Chapter> {
        self.chapters
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Chapter '{}' not found", id)))
    }

    async fn ensure_subject_name_free(&self, name: &str, except_id: Option<&str>) -> AppResult<()> {
        match self.subjects.find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != except_id => Err(
                AppError::AlreadyExists(format!("Subject '{}' already exists", name.trim())),
            ),
            _ => Ok(()),
        }
    }

    async fn quiz_counts_by_chapter(&self) -> AppResult<HashMap<String, u64>> {
        let mut counts = HashMap::new();
        for quiz in self.quizzes.find_all().await? {
            *counts.entry(quiz.chapter_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
