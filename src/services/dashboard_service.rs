use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, NaiveDate, Utc};

use crate::{
    errors::AppResult,
    models::{
        domain::{QuizAttempt, UserRole},
        dto::response::{AdminChartData, AdminDashboardStats, GraphData, UserDashboardStats},
    },
    repositories::{QuizAttemptRepository, QuizRepository, SubjectRepository, UserRepository},
    services::statistics::{round_to, summarize, PerformanceLadder},
};

const GRAPH_ATTEMPTS: usize = 10;
const CHART_DAYS: i64 = 7;

pub struct DashboardService {
    users: Arc<dyn UserRepository>,
    subjects: Arc<dyn SubjectRepository>,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    ladder: PerformanceLadder,
}

impl DashboardService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subjects: Arc<dyn SubjectRepository>,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        ladder: PerformanceLadder,
    ) -> Self {
        Self {
            users,
            subjects,
            quizzes,
            attempts,
            ladder,
        }
    }

    pub async fn user_stats(&self, user_id: &str) -> AppResult<UserDashboardStats> {
        let summary = summarize(&self.attempts.find_by_user(user_id).await?);

        Ok(UserDashboardStats {
            quizzes_taken: summary.attempts as i64,
            average_score: round_to(summary.average_percentage, 1),
            best_score: round_to(summary.best_percentage, 1),
            total_questions_answered: summary.total_questions_answered,
            performance: self.ladder.bucket(summary.average_percentage).to_string(),
        })
    }

    /// The most recent attempts in chronological order.
    pub async fn user_graph(&self, user_id: &str) -> AppResult<GraphData> {
        let mut recent: Vec<QuizAttempt> = self
            .attempts
            .find_by_user(user_id)
            .await?
            .into_iter()
            .take(GRAPH_ATTEMPTS)
            .collect();
        recent.reverse();

        let mut titles: HashMap<String, String> = HashMap::new();
        let mut labels = Vec::with_capacity(recent.len());
        for attempt in &recent {
            if !titles.contains_key(&attempt.quiz_id) {
                let title = self
                    .quizzes
                    .find_by_id(&attempt.quiz_id)
                    .await?
                    .map(|quiz| quiz.title)
                    .unwrap_or_else(|| "Unknown Quiz".to_string());
                titles.insert(attempt.quiz_id.clone(), title);
            }
            labels.push(titles[&attempt.quiz_id].clone());
        }

        Ok(GraphData {
            labels,
            data: recent.iter().map(|a| round_to(a.percentage(), 2)).collect(),
        })
    }

    pub async fn admin_stats(&self) -> AppResult<AdminDashboardStats> {
        Ok(AdminDashboardStats {
            total_users: self.users.count_by_role(UserRole::User).await?,
            total_subjects: self.subjects.count().await?,
            total_quizzes: self.quizzes.count().await?,
            total_attempts: self.attempts.count().await?,
        })
    }

    pub async fn admin_chart(&self) -> AppResult<AdminChartData> {
        let today = Utc::now().date_naive();
        let first_day = today - Duration::days(CHART_DAYS - 1);
        let since = first_day
            .and_hms_opt(0, 0, 0)
            .map(|start| start.and_utc())
            .unwrap_or_else(Utc::now);

        let attempts = self.attempts.find_since(since).await?;
        Ok(attempts_per_day(&attempts, today, CHART_DAYS))
    }
}

/// Attempt counts for the `days` days ending with `today`, oldest first.
pub fn attempts_per_day(attempts: &[QuizAttempt], today: NaiveDate, days: i64) -> AdminChartData {
    let mut labels = Vec::with_capacity(days as usize);
    let mut counts = Vec::with_capacity(days as usize);

    for offset in (0..days).rev() {
        let day = today - Duration::days(offset);
        labels.push(day.format("%b %d").to_string());
        counts.push(
            attempts
                .iter()
                .filter(|a| a.submitted_at.date_naive() == day)
                .count() as u64,
        );
    }

    AdminChartData {
        labels,
        attempts: counts,
    }
}
