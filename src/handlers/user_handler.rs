use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    jobs::Job,
    models::dto::{
        request::UpdateProfileRequest,
        response::{ApiResponse, JobAccepted},
    },
};

#[get("/api/user/quizzes")]
pub async fn available_quizzes(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state.quiz_service.available_quizzes(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[get("/api/user/scores")]
pub async fn list_scores(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let scores = state.quiz_attempt_service.list_scores(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(scores))
}

#[get("/api/user/scores/{id}")]
pub async fn score_details(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let details = state
        .quiz_attempt_service
        .score_details(&auth.0.sub, &id)
        .await?;
    Ok(HttpResponse::Ok().json(details))
}

#[get("/api/user/dashboard/stats")]
pub async fn dashboard_stats(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let stats = state.dashboard_service.user_stats(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/api/user/dashboard/graph-data")]
pub async fn dashboard_graph(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let graph = state.dashboard_service.user_graph(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(graph))
}

#[get("/api/user/profile")]
pub async fn get_profile(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.user_service.get_profile(&auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[put("/api/user/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    request: web::Json<UpdateProfileRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state
        .user_service
        .update_profile(&auth.0.sub, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new(user, "Profile updated")))
}

#[post("/api/user/exports")]
pub async fn export_scores(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let job = Job::UserExport {
        user_id: auth.0.sub.clone(),
    };
    let name = job.to_string();
    state.job_queue.enqueue(job)?;

    Ok(HttpResponse::Accepted().json(JobAccepted {
        message: "Export started. The CSV will be emailed to you.".to_string(),
        job: name,
    }))
}

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/health/ready")]
pub async fn health_check_ready(state: web::Data<AppState>) -> HttpResponse {
    let db_health = state.health.health_check().await;

    let status = if db_health.is_ok() {
        "ready"
    } else {
        "not_ready"
    };

    let response = serde_json::json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if db_health.is_ok() { "ok" } else { "error" }
        }
    });

    if db_health.is_ok() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

#[get("/health/live")]
pub async fn health_check_live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().service(health_check)).await;

        let req = test::TestRequest::get().uri("/health").to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_liveness_reports_alive() {
        let app = test::init_service(App::new().service(health_check_live)).await;

        let req = test::TestRequest::get().uri("/health/live").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "alive");
    }
}
