pub mod auth_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod provisioning;
pub mod quiz_attempt_service;
pub mod quiz_service;
pub mod statistics;
pub mod user_service;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use dashboard_service::DashboardService;
pub use quiz_attempt_service::QuizAttemptService;
pub use quiz_service::QuizService;
pub use user_service::UserService;
