use secrecy::SecretString;
use std::env;

use crate::services::statistics::PerformanceLadder;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub jwt_refresh_expiration_hours: i64,
    pub admin_email: String,
    pub admin_password: SecretString,
    pub mail_from: String,
    pub job_max_retries: u32,
    pub reminder_interval_hours: u64,
    pub report_interval_days: u64,
    pub performance_ladder: PerformanceLadder,
}

impl Config {
    pub fn from_env() -> Self {
        let performance_ladder = match env::var("PERFORMANCE_LADDER") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                log::warn!("Ignoring PERFORMANCE_LADDER ({}), using default ladder", err);
                PerformanceLadder::default()
            }),
            Err(_) => PerformanceLadder::default(),
        };

        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizmaster-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_env("WEB_SERVER_PORT", 8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: parse_env("JWT_EXPIRATION_HOURS", 24),
            jwt_refresh_expiration_hours: parse_env("JWT_REFRESH_EXPIRATION_HOURS", 168),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@quizmaster.com".to_string()),
            admin_password: SecretString::from(
                env::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            ),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@quizmaster.com".to_string()),
            job_max_retries: parse_env("JOB_MAX_RETRIES", 3),
            reminder_interval_hours: parse_env("REMINDER_INTERVAL_HOURS", 24),
            report_interval_days: parse_env("REPORT_INTERVAL_DAYS", 30),
            performance_ladder,
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.admin_password.expose_secret() == DEFAULT_ADMIN_PASSWORD {
            panic!(
                "FATAL: ADMIN_PASSWORD is using default value! Set ADMIN_PASSWORD environment variable."
            );
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizmaster-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            jwt_refresh_expiration_hours: 24,
            admin_email: "admin@example.com".to_string(),
            admin_password: SecretString::from("admin-test-password".to_string()),
            mail_from: "noreply@example.com".to_string(),
            job_max_retries: 2,
            reminder_interval_hours: 24,
            report_interval_days: 30,
            performance_ladder: PerformanceLadder::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
