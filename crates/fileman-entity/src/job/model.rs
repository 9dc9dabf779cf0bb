//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::JobStatus;

/// A unit of work carried by a queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Name of the queue holding the job.
    pub queue: String,
    /// Producer-supplied payload.
    pub payload: serde_json::Value,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Number of times a consumer has claimed the job.
    pub attempts: u32,
    /// Attempts allowed before the job is failed for good.
    pub max_attempts: u32,
    /// Last failure message.
    pub error_message: Option<String>,
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the job was last claimed.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a freshly queued job.
    pub fn new(queue: impl Into<String>, payload: serde_json::Value, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: queue.into(),
            payload,
            status: JobStatus::Queued,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Transition to `Processing` and count the attempt.
    pub fn mark_processing(&mut self) {
        self.status = JobStatus::Processing;
        self.attempts += 1;
        self.started_at = Some(Utc::now());
    }

    /// Transition to `Completed`.
    pub fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
        self.error_message = None;
        self.finished_at = Some(Utc::now());
    }

    /// Transition to `Failed`, keeping the error message.
    pub fn mark_failed(&mut self, error: &str) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.to_string());
        self.finished_at = Some(Utc::now());
    }

    /// Put the job back in the queue for another attempt.
    pub fn mark_requeued(&mut self) {
        self.status = JobStatus::Queued;
        self.started_at = None;
    }

    /// Whether another attempt is allowed after the current one.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }
}
