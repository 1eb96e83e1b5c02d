//! Background work: reminders, monthly reports and CSV exports.
//!
//! Jobs are read-only over users and attempts and run on an in-process
//! queue ([`queue::JobQueue`]) off the request path.

pub mod exports;
pub mod mailer;
pub mod queue;
pub mod reminders;
pub mod render;
pub mod reports;
pub mod scheduler;

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    errors::AppResult,
    models::domain::Quiz,
    repositories::{
        ChapterRepository, QuizAttemptRepository, QuizRepository, SubjectRepository,
        UserRepository,
    },
    services::statistics::PerformanceLadder,
};

pub use mailer::{Email, LogMailer, Mailer};
pub use queue::{run_with_retry, JobQueue, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    DailyReminders,
    MonthlyReports,
    UserExport { user_id: String },
    AdminExport { recipient: String },
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::DailyReminders => write!(f, "daily-reminders"),
            Job::MonthlyReports => write!(f, "monthly-reports"),
            Job::UserExport { user_id } => write!(f, "user-export({})", user_id),
            Job::AdminExport { recipient } => write!(f, "admin-export({})", recipient),
        }
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> AppResult<()>;
}

/// Everything the jobs read from, plus the mail sink.
pub struct JobRunner {
    pub users: Arc<dyn UserRepository>,
    pub subjects: Arc<dyn SubjectRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn QuizAttemptRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub ladder: PerformanceLadder,
    pub retry: RetryPolicy,
}

/// Outcome of a job that mails many recipients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub sent: usize,
    pub failed: usize,
}

impl Delivery {
    fn log(&self, what: &str) {
        if self.failed > 0 {
            log::warn!("Sent {} {}, {} could not be delivered", self.sent, what, self.failed);
        } else {
            log::info!("Sent {} {}", self.sent, what);
        }
    }
}

impl JobRunner {
    /// Quizzes by id, for resolving titles of attempts.
    pub(crate) async fn quiz_index(&self) -> AppResult<HashMap<String, Quiz>> {
        Ok(self
            .quizzes
            .find_all()
            .await?
            .into_iter()
            .map(|quiz| (quiz.id.clone(), quiz))
            .collect())
    }

    /// Sends each email under its own retry budget. Recipients that keep
    /// failing are counted in the result, never returned as an error.
    pub(crate) async fn deliver(&self, emails: Vec<Email>) -> Delivery {
        let mut delivery = Delivery::default();
        for email in emails {
            let label = format!("mail to {}", email.to);
            let mailer = &self.mailer;
            match run_with_retry(&label, self.retry, || mailer.send(email.clone())).await {
                Ok(()) => delivery.sent += 1,
                Err(_) => delivery.failed += 1,
            }
        }
        delivery
    }
}

#[async_trait]
impl JobHandler for JobRunner {
    async fn handle(&self, job: &Job) -> AppResult<()> {
        let now = Utc::now();
        match job {
            Job::DailyReminders => {
                reminders::send_daily_reminders(self, now)
                    .await?
                    .log("daily reminders");
            }
            Job::MonthlyReports => {
                reports::send_monthly_reports(self, now)
                    .await?
                    .log("monthly reports");
            }
            Job::UserExport { user_id } => exports::send_user_export(self, user_id, now).await?,
            Job::AdminExport { recipient } => {
                exports::send_admin_export(self, recipient, now).await?
            }
        }
        Ok(())
    }
}
