use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    errors::{AppError, AppResult},
    jobs::{Job, JobHandler},
};

const QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(2),
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2×base, 4×base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Runs `operation` until it succeeds or the retries are used up. Returns
/// the last error in the latter case.
pub async fn run_with_retry<F, Fut>(label: &str, policy: RetryPolicy, mut operation: F) -> AppResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(()) => return Ok(()),
            Err(err) if retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                log::warn!(
                    "Job {} failed ({}); retry {}/{} in {:?}",
                    label,
                    err,
                    retry,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                log::error!("Job {} gave up after {} retries: {}", label, retry, err);
                return Err(err);
            }
        }
    }
}

/// Handle for submitting jobs to the background worker.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
}

impl JobQueue {
    /// Spawns the worker on the current tokio runtime. It processes jobs one
    /// at a time and stops once every `JobQueue` handle is dropped.
    pub fn start(handler: Arc<dyn JobHandler>, policy: RetryPolicy) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(work(receiver, handler, policy));
        (Self { sender }, worker)
    }

    pub fn enqueue(&self, job: Job) -> AppResult<()> {
        log::debug!("Queueing job {}", job);
        self.sender.try_send(job).map_err(|e| {
            AppError::InternalError(format!("Job queue unavailable: {}", e))
        })
    }
}

async fn work(mut receiver: mpsc::Receiver<Job>, handler: Arc<dyn JobHandler>, policy: RetryPolicy) {
    log::info!("Job worker started");
    while let Some(job) = receiver.recv().await {
        let label = job.to_string();
        // Failures are logged inside; the worker moves on to the next job.
        let _ = run_with_retry(&label, policy, || handler.handle(&job)).await;
    }
    log::info!("Job worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Mutex;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = run_with_retry("flaky", fast_policy(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AppError::InternalError("smtp down".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result = run_with_retry("broken", fast_policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::InternalError("still down".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    struct RecordingHandler {
        seen: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        async fn handle(&self, job: &Job) -> AppResult<()> {
            self.seen.lock().await.push(job.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn worker_processes_jobs_in_order() {
        let handler = Arc::new(RecordingHandler {
            seen: Mutex::new(Vec::new()),
        });
        let (queue, worker) = JobQueue::start(handler.clone(), fast_policy(0));

        queue.enqueue(Job::DailyReminders).unwrap();
        queue
            .enqueue(Job::UserExport {
                user_id: "user-1".into(),
            })
            .unwrap();
        drop(queue);
        worker.await.unwrap();

        let seen = handler.seen.lock().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Job::DailyReminders);
    }
}
