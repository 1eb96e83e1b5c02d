use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    jobs::{
        mailer::{Attachment, Email},
        render::sanitize_filename,
        JobRunner,
    },
    models::domain::{QuizAttempt, User, UserRole},
    services::statistics::{self, PerformanceLadder},
};

const CSV_CONTENT_TYPE: &str = "text/csv";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Serialize)]
pub(crate) struct AttemptRow {
    #[serde(rename = "Quiz ID")]
    pub quiz_id: String,
    #[serde(rename = "Quiz Title")]
    pub quiz_title: String,
    #[serde(rename = "Chapter")]
    pub chapter: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Date Attempted")]
    pub attempted_at: String,
    #[serde(rename = "Score")]
    pub score: i32,
    #[serde(rename = "Total Questions")]
    pub total_questions: i32,
    #[serde(rename = "Percentage")]
    pub percentage: String,
    #[serde(rename = "Time Taken (seconds)")]
    pub time_taken_seconds: i64,
    #[serde(rename = "Remarks")]
    pub remarks: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PerformanceRow {
    #[serde(rename = "User ID")]
    pub user_id: String,
    #[serde(rename = "Full Name")]
    pub full_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Qualification")]
    pub qualification: String,
    #[serde(rename = "Date of Birth")]
    pub dob: String,
    #[serde(rename = "Registration Date")]
    pub registered_on: String,
    #[serde(rename = "Total Quizzes Taken")]
    pub attempts: usize,
    #[serde(rename = "Average Score (%)")]
    pub average: String,
    #[serde(rename = "Best Score (%)")]
    pub best: String,
    #[serde(rename = "Last Quiz Date")]
    pub last_quiz_date: String,
    #[serde(rename = "Performance Level")]
    pub performance: String,
}

pub(crate) fn write_csv<R: Serialize>(rows: &[R]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(bytes)
}

pub(crate) fn performance_row(
    user: &User,
    attempts: &[QuizAttempt],
    ladder: &PerformanceLadder,
) -> PerformanceRow {
    let summary = statistics::summarize(attempts);
    let (last_quiz_date, performance) = match attempts.iter().map(|a| a.submitted_at).max() {
        Some(last) => (
            last.format("%Y-%m-%d").to_string(),
            ladder.bucket(summary.average_percentage).to_string(),
        ),
        None => ("Never".to_string(), "No Attempts".to_string()),
    };

    PerformanceRow {
        user_id: user.id.clone(),
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        qualification: user.qualification.clone().unwrap_or_default(),
        dob: user.dob.map(|d| d.to_string()).unwrap_or_default(),
        registered_on: user
            .created_at
            .map(|c| c.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        attempts: summary.attempts,
        average: format!("{:.2}", summary.average_percentage),
        best: format!("{:.2}", summary.best_percentage),
        last_quiz_date,
        performance,
    }
}

async fn attempt_rows(runner: &JobRunner, attempts: &[QuizAttempt]) -> AppResult<Vec<AttemptRow>> {
    let quizzes = runner.quiz_index().await?;
    let chapters: HashMap<_, _> = runner
        .chapters
        .find_all()
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
    let subjects: HashMap<_, _> = runner
        .subjects
        .find_all()
        .await?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

    Ok(attempts
        .iter()
        .map(|attempt| {
            let quiz = quizzes.get(&attempt.quiz_id);
            let chapter = quiz.and_then(|q| chapters.get(&q.chapter_id));
            let subject = chapter.and_then(|c| subjects.get(&c.subject_id));
            let percentage = attempt.percentage();

            AttemptRow {
                quiz_id: attempt.quiz_id.clone(),
                quiz_title: quiz.map_or("Unknown Quiz", |q| q.title.as_str()).to_string(),
                chapter: chapter.map_or(UNKNOWN, |c| c.name.as_str()).to_string(),
                subject: subject.map_or(UNKNOWN, |s| s.name.as_str()).to_string(),
                attempted_at: attempt.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                score: attempt.total_scored,
                total_questions: attempt.total_questions,
                percentage: format!("{:.2}%", percentage),
                time_taken_seconds: attempt.time_taken_seconds,
                remarks: runner.ladder.bucket(percentage).to_string(),
            }
        })
        .collect())
}

/// Mails a user the CSV of all their attempts, newest first.
pub async fn send_user_export(runner: &JobRunner, user_id: &str, now: DateTime<Utc>) -> AppResult<()> {
    let user = runner
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let attempts = runner.attempts.find_by_user(&user.id).await?;
    if attempts.is_empty() {
        log::info!("Skipping export for {}: no quiz attempts", user.email);
        return Ok(());
    }

    let data = write_csv(&attempt_rows(runner, &attempts).await?)?;
    let filename = sanitize_filename(&format!(
        "quiz_data_{}_{}.csv",
        user.full_name.replace(' ', "_"),
        now.format("%Y%m%d")
    ));

    runner
        .mailer
        .send(Email {
            to: user.email.clone(),
            subject: format!("Quiz Data Export - {}", user.full_name),
            text_body: Some(format!(
                "Hello {},\n\nYour quiz data export has been completed. Please find the CSV file attached.\n\n\
                 It lists all your quiz attempts with scores, dates and performance remarks.\n\n\
                 Best regards,\nQuiz Master Team\n",
                user.full_name
            )),
            attachments: vec![Attachment {
                filename,
                content_type: CSV_CONTENT_TYPE.to_string(),
                data,
            }],
            ..Default::default()
        })
        .await?;

    log::info!("Exported {} attempts for {}", attempts.len(), user.email);
    Ok(())
}

/// Mails `recipient` a performance overview of every regular user.
pub async fn send_admin_export(runner: &JobRunner, recipient: &str, now: DateTime<Utc>) -> AppResult<()> {
    let users = runner.users.find_by_role(UserRole::User).await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in &users {
        let attempts = runner.attempts.find_by_user(&user.id).await?;
        rows.push(performance_row(user, &attempts, &runner.ladder));
    }
    let data = write_csv(&rows)?;

    runner
        .mailer
        .send(Email {
            to: recipient.to_string(),
            subject: "User Performance Data Export".to_string(),
            text_body: Some(
                "Hello Administrator,\n\nThe user performance data export has been completed. \
                 Please find the CSV file attached.\n\nBest regards,\nQuiz Master System\n"
                    .to_string(),
            ),
            attachments: vec![Attachment {
                filename: sanitize_filename(&format!(
                    "user_performance_data_{}.csv",
                    now.format("%Y%m%d_%H%M%S")
                )),
                content_type: CSV_CONTENT_TYPE.to_string(),
                data,
            }],
            ..Default::default()
        })
        .await?;

    log::info!("Exported performance of {} users to {}", rows.len(), recipient);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jobs::mailer::MockMailer,
        models::domain::{Chapter, Quiz, Subject},
        test_utils::memory::MemoryStore,
    };
    use chrono::{Duration, NaiveDate, TimeZone};

    #[test]
    fn test_unwritable_row_surfaces_csv_error() {
        let rows = vec![HashMap::from([("attempts", 1)])];
        let err = write_csv(&rows).unwrap_err();
        assert!(matches!(err, AppError::InternalError(ref msg) if msg.starts_with("CSV error")));
    }

    #[test]
    fn test_performance_row_without_attempts() {
        let user = User::test_user("idle@example.com");
        let row = performance_row(&user, &[], &PerformanceLadder::default());
        assert_eq!(row.attempts, 0);
        assert_eq!(row.average, "0.00");
        assert_eq!(row.last_quiz_date, "Never");
        assert_eq!(row.performance, "No Attempts");
    }

    #[test]
    fn test_performance_row_uses_mean_and_best() {
        let user = User::test_user("amy@example.com");
        let day = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let attempts = vec![
            QuizAttempt::new(&user.id, "q1", 4, 4, 60, day),
            QuizAttempt::new(&user.id, "q2", 1, 2, 60, day + Duration::days(3)),
        ];

        let row = performance_row(&user, &attempts, &PerformanceLadder::default());
        assert_eq!(row.attempts, 2);
        assert_eq!(row.average, "75.00");
        assert_eq!(row.best, "100.00");
        assert_eq!(row.last_quiz_date, "2024-05-05");
        assert_eq!(row.performance, "Good");
    }

    #[test]
    fn test_csv_has_header_row() {
        let user = User::test_user("amy@example.com");
        let rows = vec![performance_row(&user, &[], &PerformanceLadder::default())];
        let data = write_csv(&rows).unwrap();
        let text = String::from_utf8(data).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("User ID,Full Name,Email"));
        assert!(lines.next().unwrap().contains("amy@example.com"));
    }

    #[tokio::test]
    async fn test_user_export_attaches_csv() {
        let store = MemoryStore::default();
        let user = User::test_user("amy@example.com");
        store.add_user(user.clone()).await;

        let subject = Subject::new("Maths", None);
        let chapter = Chapter::new(&subject.id, "Algebra", None);
        let quiz = Quiz::new(&chapter.id, "Linear equations", None, 20, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        store.add_subject(subject).await;
        store.add_chapter(chapter).await;
        store.add_quiz(quiz.clone()).await;
        store
            .add_attempt(QuizAttempt::new(&user.id, &quiz.id, 3, 4, 90, Utc::now()))
            .await;

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                let Some(attachment) = email.attachments.first() else {
                    return false;
                };
                let csv = String::from_utf8_lossy(&attachment.data);
                email.to == "amy@example.com"
                    && attachment.content_type == "text/csv"
                    && attachment.filename.starts_with("quiz_data_Test_User_")
                    && csv.contains("Linear equations,Algebra,Maths")
                    && csv.contains("75.00%")
            })
            .times(1)
            .returning(|_| Ok(()));

        let runner = store.runner(mailer);
        send_user_export(&runner, &user.id, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_export_for_unknown_user_fails() {
        let store = MemoryStore::default();
        let runner = store.runner(MockMailer::new());
        let err = send_user_export(&runner, "ghost", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_admin_export_covers_every_user() {
        let store = MemoryStore::default();
        store.add_user(User::test_user("a@example.com")).await;
        store.add_user(User::test_user("b@example.com")).await;
        store.add_user(User::new_admin("admin@example.com", "hash".into())).await;

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| {
                let csv = String::from_utf8_lossy(&email.attachments[0].data).to_string();
                email.to == "admin@example.com" && csv.lines().count() == 3
            })
            .times(1)
            .returning(|_| Ok(()));

        let runner = store.runner(mailer);
        send_admin_export(&runner, "admin@example.com", Utc::now()).await.unwrap();
    }
}
