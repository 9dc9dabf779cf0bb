//! The job queue contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fileman_core::config::QueueConfig;
use fileman_core::result::AppResult;
use fileman_entity::job::Job;

/// Queue holding `{fileId, userId}` thumbnail jobs.
pub const THUMBNAIL_QUEUE: &str = "thumbnail_generation";

/// Queue holding `{userId}` welcome email jobs.
pub const EMAIL_QUEUE: &str = "email_sending";

/// Per-queue job counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting to be claimed.
    pub waiting: u64,
    /// Jobs claimed by a consumer and not yet finished.
    pub active: u64,
    /// Jobs that completed.
    pub completed: u64,
    /// Jobs that failed for good.
    pub failed: u64,
}

/// Claim lease and retention settings of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    /// How long a claim stays valid without [`JobQueue::extend_lease`].
    pub lease: Duration,
    /// Completed jobs kept before the oldest are deleted.
    pub keep_completed: usize,
    /// Failed jobs kept before the oldest are deleted.
    pub keep_failed: usize,
}

impl QueueLimits {
    /// Limits from the queue configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            lease: Duration::from_secs(config.lease_seconds),
            keep_completed: config.keep_completed,
            keep_failed: config.keep_failed,
        }
    }
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// A named FIFO queue of jobs.
///
/// Jobs move `Queued -> Processing -> {Completed | Failed}`. A claim is a
/// lease: the job stays owned by its consumer until the consumer calls
/// [`complete`], [`fail`] or [`requeue`], or until the lease runs out
/// without an [`extend_lease`]. [`recover_stalled`] hands expired claims
/// out again, after which the late consumer's report is ignored.
///
/// [`complete`]: JobQueue::complete
/// [`fail`]: JobQueue::fail
/// [`requeue`]: JobQueue::requeue
/// [`extend_lease`]: JobQueue::extend_lease
/// [`recover_stalled`]: JobQueue::recover_stalled
#[async_trait]
pub trait JobQueue: Send + Sync + std::fmt::Debug {
    /// Queue name.
    fn name(&self) -> &str;

    /// How long a claim is valid without renewal.
    fn lease(&self) -> Duration;

    /// Append a job with the given payload to the tail of the queue.
    async fn enqueue(&self, payload: serde_json::Value) -> AppResult<Job>;

    /// Claim the job at the head of the queue, if any. The returned job is
    /// already marked `Processing` with its attempt counted.
    async fn dequeue(&self) -> AppResult<Option<Job>>;

    /// Mark a claimed job completed.
    ///
    /// Returns `false`, and changes nothing, when the job is no longer
    /// claimed (its lease expired and it was recovered).
    async fn complete(&self, job: &mut Job) -> AppResult<bool>;

    /// Mark a claimed job failed with the given error message. Returns
    /// `false` when the job is no longer claimed.
    async fn fail(&self, job: &mut Job, error: &str) -> AppResult<bool>;

    /// Put a claimed job back at the tail of the queue. Returns `false`
    /// when the job is no longer claimed.
    async fn requeue(&self, job: &mut Job) -> AppResult<bool>;

    /// Renew the lease of a claimed job. Returns `false` when the job is
    /// no longer claimed.
    async fn extend_lease(&self, job: &Job) -> AppResult<bool>;

    /// Look up a job by id.
    async fn get(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Current counters.
    async fn stats(&self) -> AppResult<QueueStats>;

    /// Return every claimed job whose lease has expired to the head of the
    /// queue, oldest claim first. Returns how many were recovered.
    async fn recover_stalled(&self) -> AppResult<u64>;

    /// Whether the broker is reachable.
    async fn is_alive(&self) -> bool;
}
