//! Job executor: runs one job and reports the outcome to its queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use fileman_core::result::AppResult;
use fileman_entity::job::Job;
use fileman_queue::JobQueue;

use crate::error::JobError;

/// Consumer contract of one queue.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Name of the queue this handler consumes.
    fn queue(&self) -> &str;

    /// Process one job.
    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// Decode a job payload into its typed form.
pub fn parse_payload<T: DeserializeOwned>(job: &Job) -> Result<T, JobError> {
    serde_json::from_value(job.payload.clone()).map_err(|e| JobError::InvalidPayload(e.to_string()))
}

/// What happened to an executed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The handler succeeded and the job was marked completed.
    Completed,
    /// The handler failed transiently and the job went back to the queue.
    Retried,
    /// The job was marked failed with this message.
    Failed(String),
    /// The claim expired and the job was handed to another consumer
    /// before this outcome could be recorded. Nothing was written.
    Abandoned,
}

/// Shortest interval between lease renewals.
const MIN_RENEW_INTERVAL: Duration = Duration::from_millis(10);

/// Runs jobs of one queue through its handler.
#[derive(Debug)]
pub struct JobExecutor {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    retry_backoff: Duration,
}

impl JobExecutor {
    /// Create an executor. The handler must consume `queue`.
    pub fn new(
        queue: Arc<dyn JobQueue>,
        handler: Arc<dyn JobHandler>,
        retry_backoff: Duration,
    ) -> Self {
        debug_assert_eq!(queue.name(), handler.queue());
        Self {
            queue,
            handler,
            retry_backoff,
        }
    }

    /// The queue this executor drains.
    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Claim the next job, if any, and execute it.
    pub async fn run_next(&self) -> AppResult<Option<JobOutcome>> {
        match self.queue.dequeue().await? {
            Some(job) => self.execute(job).await.map(Some),
            None => Ok(None),
        }
    }

    /// Execute a claimed job and signal its outcome to the queue.
    ///
    /// Success completes the job. A retryable failure with attempts left
    /// requeues it after the backoff. Anything else fails it. The lease is
    /// renewed until the outcome is recorded.
    pub async fn execute(&self, mut job: Job) -> AppResult<JobOutcome> {
        info!(
            queue = %job.queue,
            job_id = %job.id,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            "Processing job"
        );

        match self.while_leased(&job, self.handler.handle(&job)).await {
            Ok(()) => {
                if !self.queue.complete(&mut job).await? {
                    return Ok(abandoned(&job));
                }
                info!(queue = %job.queue, job_id = %job.id, "Job completed");
                Ok(JobOutcome::Completed)
            }
            Err(e) if e.is_retryable() && job.has_attempts_left() => {
                warn!(
                    queue = %job.queue,
                    job_id = %job.id,
                    error = %e,
                    retry_in_ms = self.retry_backoff.as_millis() as u64,
                    "Job failed, will retry"
                );
                self.while_leased(&job, time::sleep(self.retry_backoff)).await;
                if !self.queue.requeue(&mut job).await? {
                    return Ok(abandoned(&job));
                }
                Ok(JobOutcome::Retried)
            }
            Err(e) => {
                let message = e.to_string();
                error!(queue = %job.queue, job_id = %job.id, error = %message, "Job failed");
                if !self.queue.fail(&mut job, &message).await? {
                    return Ok(abandoned(&job));
                }
                Ok(JobOutcome::Failed(message))
            }
        }
    }

    /// Drive `work` to completion, renewing the job's lease meanwhile.
    async fn while_leased<F: Future>(&self, job: &Job, work: F) -> F::Output {
        let period = (self.queue.lease() / 3).max(MIN_RENEW_INTERVAL);
        let mut renew = time::interval_at(Instant::now() + period, period);
        renew.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(work);

        loop {
            tokio::select! {
                output = &mut work => return output,
                _ = renew.tick() => match self.queue.extend_lease(job).await {
                    Ok(true) => {}
                    Ok(false) => warn!(queue = %job.queue, job_id = %job.id, "Job lease lost"),
                    Err(e) => warn!(queue = %job.queue, job_id = %job.id, error = %e, "Failed to renew job lease"),
                },
            }
        }
    }
}

fn abandoned(job: &Job) -> JobOutcome {
    warn!(
        queue = %job.queue,
        job_id = %job.id,
        "Job lease expired before its outcome was recorded, outcome dropped"
    );
    JobOutcome::Abandoned
}
