use std::time::Duration;

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::jobs::{Job, JobQueue};

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub reminder_every: Duration,
    pub report_every: Duration,
}

impl Schedule {
    pub fn new(reminder_interval_hours: u64, report_interval_days: u64) -> Self {
        Self {
            reminder_every: every(reminder_interval_hours, HOUR_SECS),
            report_every: every(report_interval_days, DAY_SECS),
        }
    }
}

/// `count` units of `unit_secs`, at least one unit.
fn every(count: u64, unit_secs: u64) -> Duration {
    Duration::from_secs(count.max(1).saturating_mul(unit_secs))
}

/// Enqueues the recurring jobs. The first run of each happens one full
/// interval after start-up.
pub fn spawn(queue: JobQueue, schedule: Schedule) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reminders = tokio::time::interval(schedule.reminder_every);
        let mut reports = tokio::time::interval(schedule.report_every);
        reminders.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reports.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Both intervals fire immediately on the first tick.
        reminders.tick().await;
        reports.tick().await;

        log::info!(
            "Scheduler running: reminders every {:?}, reports every {:?}",
            schedule.reminder_every,
            schedule.report_every
        );

        loop {
            let job = tokio::select! {
                _ = reminders.tick() => Job::DailyReminders,
                _ = reports.tick() => Job::MonthlyReports,
            };
            if let Err(err) = queue.enqueue(job) {
                log::error!("Scheduler could not queue job: {}", err);
            }
        }
    })
}
