pub mod admin_handler;
pub mod auth_handler;
pub mod graphql_handler;
pub mod quiz_handler;
pub mod user_handler;

use actix_web::web;

/// Registers every HTTP route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_handler::register)
        .service(auth_handler::login)
        .service(auth_handler::refresh)
        .service(auth_handler::logout)
        .service(auth_handler::me)
        .service(quiz_handler::start_quiz)
        .service(quiz_handler::submit_quiz)
        .service(user_handler::available_quizzes)
        .service(user_handler::list_scores)
        .service(user_handler::score_details)
        .service(user_handler::dashboard_stats)
        .service(user_handler::dashboard_graph)
        .service(user_handler::get_profile)
        .service(user_handler::update_profile)
        .service(user_handler::export_scores)
        .service(user_handler::health_check)
        .service(user_handler::health_check_ready)
        .service(user_handler::health_check_live)
        .service(admin_handler::list_subjects)
        .service(admin_handler::create_subject)
        .service(admin_handler::get_subject)
        .service(admin_handler::update_subject)
        .service(admin_handler::delete_subject)
        .service(admin_handler::list_chapters)
        .service(admin_handler::create_chapter)
        .service(admin_handler::get_chapter)
        .service(admin_handler::update_chapter)
        .service(admin_handler::delete_chapter)
        .service(admin_handler::list_quizzes)
        .service(admin_handler::create_quiz)
        .service(admin_handler::get_quiz)
        .service(admin_handler::update_quiz)
        .service(admin_handler::delete_quiz)
        .service(admin_handler::list_questions)
        .service(admin_handler::create_question)
        .service(admin_handler::update_question)
        .service(admin_handler::delete_question)
        .service(admin_handler::dashboard_stats)
        .service(admin_handler::dashboard_chart)
        .service(admin_handler::list_users)
        .service(admin_handler::export_users)
        .service(graphql_handler::graphql)
        .service(graphql_handler::graphiql);
}
