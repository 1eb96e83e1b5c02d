use chrono::{DateTime, Duration, Utc};

use crate::{
    errors::AppResult,
    jobs::{mailer::Email, Delivery, JobRunner},
    models::domain::{User, UserRole},
};

pub(crate) fn reminder_email(user: &User, new_quiz_count: usize) -> Email {
    let body = if new_quiz_count > 0 {
        format!(
            "Hello {},\n\n\
             We have {} new quiz(es) available on Quiz Master!\n\n\
             Don't miss out on testing your knowledge. Visit the platform and take a quiz today.\n\n\
             Best regards,\nQuiz Master Team\n",
            user.full_name, new_quiz_count
        )
    } else {
        format!(
            "Hello {},\n\n\
             It's been a while since your last quiz attempt.\n\n\
             Visit Quiz Master and challenge yourself with the available quizzes.\n\n\
             Best regards,\nQuiz Master Team\n",
            user.full_name
        )
    };

    Email {
        to: user.email.clone(),
        subject: "Quiz Master - Daily Reminder".to_string(),
        text_body: Some(body),
        ..Default::default()
    }
}

/// Reminds every user who has not submitted anything in the last 24 hours,
/// provided new active quizzes appeared in that window or the user has
/// never attempted a quiz.
pub async fn send_daily_reminders(runner: &JobRunner, now: DateTime<Utc>) -> AppResult<Delivery> {
    let since = now - Duration::hours(24);

    let new_quiz_count = runner
        .quizzes
        .find_active()
        .await?
        .iter()
        .filter(|quiz| quiz.created_at.is_some_and(|created| created >= since))
        .count();

    let mut emails = Vec::new();
    for user in runner.users.find_by_role(UserRole::User).await? {
        let attempts = runner.attempts.find_by_user(&user.id).await?;
        if attempts.iter().any(|a| a.submitted_at >= since) {
            continue;
        }
        if new_quiz_count == 0 && !attempts.is_empty() {
            continue;
        }
        emails.push(reminder_email(&user, new_quiz_count));
    }

    Ok(runner.deliver(emails).await)
}
