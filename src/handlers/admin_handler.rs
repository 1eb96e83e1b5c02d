use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;

use crate::{
    app_state::AppState,
    auth::AdminUser,
    errors::AppError,
    jobs::Job,
    models::dto::{
        request::{
            CreateChapterRequest, CreateQuizRequest, CreateSubjectRequest, PaginationParams,
            QuestionRequest, UpdateChapterRequest, UpdateQuizRequest, UpdateSubjectRequest,
        },
        response::{ApiResponse, JobAccepted, MessageResponse},
    },
};

#[derive(Debug, Deserialize)]
pub struct ChapterFilter {
    pub subject_id: Option<String>,
}

// Subjects

#[get("/api/admin/subjects")]
pub async fn list_subjects(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let subjects = state.catalog_service.list_subjects().await?;
    Ok(HttpResponse::Ok().json(subjects))
}

#[post("/api/admin/subjects")]
pub async fn create_subject(
    state: web::Data<AppState>,
    request: web::Json<CreateSubjectRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let subject = state.catalog_service.create_subject(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(subject, "Subject created successfully")))
}

#[get("/api/admin/subjects/{id}")]
pub async fn get_subject(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let subject = state.catalog_service.get_subject(&id).await?;
    Ok(HttpResponse::Ok().json(subject))
}

#[put("/api/admin/subjects/{id}")]
pub async fn update_subject(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateSubjectRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let subject = state
        .catalog_service
        .update_subject(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(subject, "Subject updated successfully")))
}

#[delete("/api/admin/subjects/{id}")]
pub async fn delete_subject(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    state.catalog_service.delete_subject(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Subject deleted successfully")))
}

// Chapters

#[get("/api/admin/chapters")]
pub async fn list_chapters(
    state: web::Data<AppState>,
    filter: web::Query<ChapterFilter>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let chapters = state
        .catalog_service
        .list_chapters(filter.subject_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(chapters))
}

#[post("/api/admin/chapters")]
pub async fn create_chapter(
    state: web::Data<AppState>,
    request: web::Json<CreateChapterRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let chapter = state.catalog_service.create_chapter(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(chapter, "Chapter created successfully")))
}

#[get("/api/admin/chapters/{id}")]
pub async fn get_chapter(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let chapter = state.catalog_service.get_chapter(&id).await?;
    Ok(HttpResponse::Ok().json(chapter))
}

#[put("/api/admin/chapters/{id}")]
pub async fn update_chapter(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateChapterRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let chapter = state
        .catalog_service
        .update_chapter(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(chapter, "Chapter updated successfully")))
}

#[delete("/api/admin/chapters/{id}")]
pub async fn delete_chapter(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    state.catalog_service.delete_chapter(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Chapter deleted successfully")))
}

// Quizzes

#[get("/api/admin/quizzes")]
pub async fn list_quizzes(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state.quiz_service.list_quizzes().await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[post("/api/admin/quizzes")]
pub async fn create_quiz(
    state: web::Data<AppState>,
    request: web::Json<CreateQuizRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.create_quiz(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(quiz, "Quiz created successfully")))
}

#[get("/api/admin/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(&id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[put("/api/admin/quizzes/{id}")]
pub async fn update_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateQuizRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .update_quiz(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(quiz, "Quiz updated successfully")))
}

#[delete("/api/admin/quizzes/{id}")]
pub async fn delete_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.delete_quiz(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Quiz deleted successfully")))
}

// Questions

#[get("/api/admin/quizzes/{id}/questions")]
pub async fn list_questions(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let questions = state.quiz_service.list_questions(&id).await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[post("/api/admin/quizzes/{id}/questions")]
pub async fn create_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<QuestionRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .quiz_service
        .create_question(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(question, "Question created successfully")))
}

#[put("/api/admin/questions/{id}")]
pub async fn update_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<QuestionRequest>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .quiz_service
        .update_question(&id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(question, "Question updated successfully")))
}

#[delete("/api/admin/questions/{id}")]
pub async fn delete_question(
    state: web::Data<AppState>,
    id: web::Path<String>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.delete_question(&id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Question deleted successfully")))
}

// Dashboard and users

#[get("/api/admin/dashboard/stats")]
pub async fn dashboard_stats(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let stats = state.dashboard_service.admin_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/api/admin/dashboard/chart-data")]
pub async fn dashboard_chart(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let chart = state.dashboard_service.admin_chart().await?;
    Ok(HttpResponse::Ok().json(chart))
}

#[get("/api/admin/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let users = state.user_service.list_users(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/api/admin/exports/users")]
pub async fn export_users(
    state: web::Data<AppState>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let job = Job::AdminExport {
        recipient: admin.0.email.clone(),
    };
    let name = job.to_string();
    state.job_queue.enqueue(job)?;

    Ok(HttpResponse::Accepted().json(JobAccepted {
        message: "Export started. The CSV will be emailed to you.".to_string(),
        job: name,
    }))
}
