use std::{collections::HashMap, fmt::Write};

use chrono::{DateTime, Duration, Utc};

use crate::{
    errors::AppResult,
    jobs::{
        mailer::Email,
        render::{escape_html, format_duration},
        Delivery, JobRunner,
    },
    models::domain::{Quiz, QuizAttempt, User, UserRole},
    services::statistics::{self, PerformanceLadder},
};

const REPORT_WINDOW_DAYS: i64 = 30;

const REPORT_STYLE: &str = "body { font-family: Arial, sans-serif; margin: 20px; }\n\
    .header { background-color: #007bff; color: white; padding: 20px; text-align: center; }\n\
    .stats { background-color: #f8f9fa; padding: 15px; margin: 10px 0; border-radius: 5px; }\n\
    table { width: 100%; border-collapse: collapse; margin-top: 20px; }\n\
    th, td { border: 1px solid #dee2e6; padding: 8px; text-align: left; }\n\
    th { background-color: #e9ecef; }";

/// Renders the monthly activity page for one user. `attempts` are shown in
/// the order given.
pub(crate) fn render_monthly_report(
    user: &User,
    attempts: &[QuizAttempt],
    quizzes: &HashMap<String, Quiz>,
    ladder: &PerformanceLadder,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> String {
    let summary = statistics::summarize(attempts);
    let total_correct: i64 = attempts.iter().map(|a| a.total_scored as i64).sum();
    let name = escape_html(&user.full_name);

    let mut html = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<html>\n<head>\n<title>Monthly Quiz Report - {name}</title>\n<style>\n{style}\n</style>\n</head>\n<body>\n\
         <div class=\"header\">\n<h1>Monthly Quiz Report</h1>\n<p>Report for {name}</p>\n\
         <p>Period: {start} - {end}</p>\n</div>\n\
         <div class=\"stats\">\n<h2>Summary Statistics</h2>\n\
         <p><strong>Total Quizzes Attempted:</strong> {attempted}</p>\n\
         <p><strong>Total Questions Answered:</strong> {questions}</p>\n\
         <p><strong>Total Correct Answers:</strong> {correct}</p>\n\
         <p><strong>Average Score:</strong> {average:.2}%</p>\n\
         <p><strong>Best Score:</strong> {best:.2}%</p>\n\
         <p><strong>Performance:</strong> {performance}</p>\n</div>\n\
         <h2>Quiz Details</h2>\n<table>\n<thead>\n<tr><th>Quiz Title</th><th>Date Attempted</th>\
         <th>Score</th><th>Percentage</th><th>Time Taken</th></tr>\n</thead>\n<tbody>\n",
        name = name,
        style = REPORT_STYLE,
        start = period_start.format("%B %d, %Y"),
        end = period_end.format("%B %d, %Y"),
        attempted = summary.attempts,
        questions = summary.total_questions_answered,
        correct = total_correct,
        average = summary.average_percentage,
        best = summary.best_percentage,
        performance = escape_html(ladder.bucket(summary.average_percentage)),
    );

    for attempt in attempts {
        let title = quizzes
            .get(&attempt.quiz_id)
            .map(|quiz| quiz.title.as_str())
            .unwrap_or("Unknown Quiz");
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}/{}</td><td>{:.2}%</td><td>{}</td></tr>",
            escape_html(title),
            attempt.submitted_at.format("%Y-%m-%d %H:%M"),
            attempt.total_scored,
            attempt.total_questions,
            attempt.percentage(),
            format_duration(attempt.time_taken_seconds),
        );
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

/// Mails each regular user their last 30 days of attempts. Users with no
/// attempts in the window get nothing.
pub async fn send_monthly_reports(runner: &JobRunner, now: DateTime<Utc>) -> AppResult<Delivery> {
    let period_start = now - Duration::days(REPORT_WINDOW_DAYS);
    let quizzes = runner.quiz_index().await?;

    let mut by_user: HashMap<String, Vec<QuizAttempt>> = HashMap::new();
    for attempt in runner.attempts.find_since(period_start).await? {
        by_user.entry(attempt.user_id.clone()).or_default().push(attempt);
    }

    let mut emails = Vec::new();
    for user in runner.users.find_by_role(UserRole::User).await? {
        let Some(mut attempts) = by_user.remove(&user.id) else {
            log::debug!("No attempts in the last month for {}", user.email);
            continue;
        };
        attempts.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

        let html = render_monthly_report(&user, &attempts, &quizzes, &runner.ladder, period_start, now);
        emails.push(Email {
            to: user.email.clone(),
            subject: format!("Monthly Quiz Report - {}", now.format("%B %Y")),
            html_body: Some(html),
            ..Default::default()
        });
    }

    Ok(runner.deliver(emails).await)
}
