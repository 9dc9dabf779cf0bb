//! In-process job queue.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use fileman_core::error::AppError;
use fileman_core::result::AppResult;
use fileman_entity::job::Job;

use crate::queue::{JobQueue, QueueLimits, QueueStats};

#[derive(Debug, Default)]
struct QueueState {
    waiting: VecDeque<Uuid>,
    /// Claimed ids, oldest claim first.
    active: Vec<Uuid>,
    leases: HashMap<Uuid, Instant>,
    completed: VecDeque<Uuid>,
    failed: VecDeque<Uuid>,
    jobs: HashMap<Uuid, Job>,
}

impl QueueState {
    /// Drop a claim. `false` if the id was not claimed.
    fn release(&mut self, id: Uuid) -> bool {
        let Some(pos) = self.active.iter().position(|a| *a == id) else {
            return false;
        };
        self.active.remove(pos);
        self.leases.remove(&id);
        true
    }
}

/// Append `id` to a finished list, deleting the oldest entries past `keep`.
fn retain_finished(
    list: &mut VecDeque<Uuid>,
    jobs: &mut HashMap<Uuid, Job>,
    id: Uuid,
    keep: usize,
) {
    list.push_back(id);
    while list.len() > keep {
        if let Some(old) = list.pop_front() {
            jobs.remove(&old);
        }
    }
}

/// Job queue kept in process memory.
///
/// Clones share the same queue. Used by tests and for
/// `queue.provider = "memory"`, where the API and the worker run in the
/// same process.
#[derive(Debug, Clone)]
pub struct MemoryJobQueue {
    name: String,
    max_attempts: u32,
    limits: QueueLimits,
    state: Arc<Mutex<QueueState>>,
    alive: Arc<AtomicBool>,
}

impl MemoryJobQueue {
    /// Create an empty queue with default limits.
    pub fn new(name: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            name: name.into(),
            max_attempts,
            limits: QueueLimits::default(),
            state: Arc::new(Mutex::new(QueueState::default())),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Replace the lease and retention limits.
    pub fn with_limits(mut self, limits: QueueLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Mark the queue reachable or unreachable. While down, every
    /// operation fails with a queue error.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::queue(format!("Queue '{}' is unreachable", self.name)))
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn lease(&self) -> Duration {
        self.limits.lease
    }

    async fn enqueue(&self, payload: serde_json::Value) -> AppResult<Job> {
        self.check()?;
        let job = Job::new(self.name.clone(), payload, self.max_attempts);
        let mut state = self.state.lock().await;
        state.waiting.push_back(job.id);
        state.jobs.insert(job.id, job.clone());
        debug!(queue = %self.name, job_id = %job.id, "Job enqueued");
        Ok(job)
    }

    async fn dequeue(&self) -> AppResult<Option<Job>> {
        self.check()?;
        let mut state = self.state.lock().await;
        while let Some(id) = state.waiting.pop_front() {
            let Some(job) = state.jobs.get_mut(&id) else {
                continue;
            };
            job.mark_processing();
            let job = job.clone();
            state.active.push(id);
            state.leases.insert(id, Instant::now() + self.limits.lease);
            return Ok(Some(job));
        }
        Ok(None)
    }

    async fn complete(&self, job: &mut Job) -> AppResult<bool> {
        self.check()?;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if !state.release(job.id) {
            return Ok(false);
        }
        job.mark_completed();
        state.jobs.insert(job.id, job.clone());
        retain_finished(
            &mut state.completed,
            &mut state.jobs,
            job.id,
            self.limits.keep_completed,
        );
        Ok(true)
    }

    async fn fail(&self, job: &mut Job, error: &str) -> AppResult<bool> {
        self.check()?;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if !state.release(job.id) {
            return Ok(false);
        }
        job.mark_failed(error);
        state.jobs.insert(job.id, job.clone());
        retain_finished(
            &mut state.failed,
            &mut state.jobs,
            job.id,
            self.limits.keep_failed,
        );
        Ok(true)
    }

    async fn requeue(&self, job: &mut Job) -> AppResult<bool> {
        self.check()?;
        let mut state = self.state.lock().await;
        if !state.release(job.id) {
            return Ok(false);
        }
        job.mark_requeued();
        state.waiting.push_back(job.id);
        state.jobs.insert(job.id, job.clone());
        Ok(true)
    }

    async fn extend_lease(&self, job: &Job) -> AppResult<bool> {
        self.check()?;
        let mut state = self.state.lock().await;
        match state.leases.get_mut(&job.id) {
            Some(expires) => {
                *expires = Instant::now() + self.limits.lease;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Job>> {
        self.check()?;
        Ok(self.state.lock().await.jobs.get(&id).cloned())
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        self.check()?;
        let state = self.state.lock().await;
        Ok(QueueStats {
            waiting: state.waiting.len() as u64,
            active: state.active.len() as u64,
            completed: state.completed.len() as u64,
            failed: state.failed.len() as u64,
        })
    }

    async fn recover_stalled(&self) -> AppResult<u64> {
        self.check()?;
        let now = Instant::now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let expired: Vec<Uuid> = state
            .active
            .iter()
            .copied()
            .filter(|id| state.leases.get(id).is_none_or(|at| *at <= now))
            .collect();

        for id in expired.iter().rev() {
            state.release(*id);
            if let Some(job) = state.jobs.get_mut(id) {
                job.mark_requeued();
            }
            state.waiting.push_front(*id);
        }

        if !expired.is_empty() {
            info!(queue = %self.name, count = expired.len(), "Recovered stalled jobs");
        }
        Ok(expired.len() as u64)
    }

    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use fileman_entity::job::JobStatus;
    use serde_json::json;

    use super::*;

    fn limits(lease_ms: u64, keep: usize) -> QueueLimits {
        QueueLimits {
            lease: Duration::from_millis(lease_ms),
            keep_completed: keep,
            keep_failed: keep,
        }
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryJobQueue::new("email_sending", 1);
        let first = queue.enqueue(json!({"userId": "a"})).await.unwrap();
        let second = queue.enqueue(json!({"userId": "b"})).await.unwrap();

        let claimed = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, JobStatus::Processing);
        assert_eq!(claimed.attempts, 1);

        let claimed = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(claimed.id, second.id);
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_and_fail_update_stats() {
        let queue = MemoryJobQueue::new("thumbnail_generation", 1);
        queue.enqueue(json!({"fileId": "f"})).await.unwrap();
        queue.enqueue(json!({})).await.unwrap();

        let mut ok = queue.dequeue().await.unwrap().unwrap();
        let mut bad = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(queue.stats().await.unwrap().active, 2);

        assert!(queue.complete(&mut ok).await.unwrap());
        assert!(queue.fail(&mut bad, "Missing fileId").await.unwrap());

        let stats = queue.stats().await.unwrap();
        assert_eq!(
            stats,
            QueueStats {
                waiting: 0,
                active: 0,
                completed: 1,
                failed: 1
            }
        );

        let stored = queue.get(bad.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("Missing fileId"));
    }

    #[tokio::test]
    async fn test_requeue_goes_to_tail() {
        let queue = MemoryJobQueue::new("email_sending", 3);
        queue.enqueue(json!({"userId": "a"})).await.unwrap();
        let second = queue.enqueue(json!({"userId": "b"})).await.unwrap();

        let mut first = queue.dequeue().await.unwrap().unwrap();
        assert!(queue.requeue(&mut first).await.unwrap());

        let next = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(next.id, second.id);
        let retried = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(retried.id, first.id);
        assert_eq!(retried.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_stalled_only_after_lease_expires() {
        let queue = MemoryJobQueue::new("email_sending", 1).with_limits(limits(1_000, 10));
        let job = queue.enqueue(json!({"userId": "a"})).await.unwrap();
        queue.enqueue(json!({"userId": "b"})).await.unwrap();
        queue.dequeue().await.unwrap().unwrap();

        // A live claim is left alone.
        assert_eq!(queue.recover_stalled().await.unwrap(), 0);
        assert_eq!(queue.stats().await.unwrap().active, 1);

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert_eq!(queue.recover_stalled().await.unwrap(), 1);
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.active, 0);

        let again = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(again.id, job.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_lease_keeps_claim() {
        let queue = MemoryJobQueue::new("email_sending", 1).with_limits(limits(1_000, 10));
        queue.enqueue(json!({"userId": "a"})).await.unwrap();
        let job = queue.dequeue().await.unwrap().unwrap();

        tokio::time::advance(Duration::from_millis(800)).await;
        assert!(queue.extend_lease(&job).await.unwrap());
        tokio::time::advance(Duration::from_millis(800)).await;

        assert_eq!(queue.recover_stalled().await.unwrap(), 0);
        assert_eq!(queue.stats().await.unwrap().active, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_report_after_recovery_is_ignored() {
        let queue = MemoryJobQueue::new("email_sending", 1).with_limits(limits(1_000, 10));
        queue.enqueue(json!({"userId": "a"})).await.unwrap();
        let mut stale = queue.dequeue().await.unwrap().unwrap();

        tokio::time::advance(Duration::from_millis(1_001)).await;
        queue.recover_stalled().await.unwrap();
        let mut fresh = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(fresh.id, stale.id);

        // The first consumer finally reports back; it no longer owns the job.
        assert!(!queue.complete(&mut stale).await.unwrap());
        assert!(!queue.extend_lease(&stale).await.unwrap());
        assert_eq!(queue.stats().await.unwrap().active, 1);

        assert!(queue.complete(&mut fresh).await.unwrap());
        assert!(!queue.fail(&mut stale, "late").await.unwrap());
        assert!(!queue.requeue(&mut stale).await.unwrap());

        let stats = queue.stats().await.unwrap();
        assert_eq!(
            stats,
            QueueStats {
                waiting: 0,
                active: 0,
                completed: 1,
                failed: 0
            }
        );
        let stored = queue.get(fresh.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.attempts, 2);
    }

    #[tokio::test]
    async fn test_finished_jobs_are_trimmed() {
        let queue = MemoryJobQueue::new("thumbnail_generation", 1).with_limits(limits(60_000, 2));
        let mut ids = Vec::new();
        for n in 0..3 {
            ids.push(queue.enqueue(json!({"fileId": n})).await.unwrap().id);
        }
        for _ in 0..3 {
            let mut job = queue.dequeue().await.unwrap().unwrap();
            queue.complete(&mut job).await.unwrap();
        }

        assert_eq!(queue.stats().await.unwrap().completed, 2);
        assert!(queue.get(ids[0]).await.unwrap().is_none());
        assert!(queue.get(ids[1]).await.unwrap().is_some());
        assert!(queue.get(ids[2]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let queue = MemoryJobQueue::new("email_sending", 1);
        queue.set_alive(false);
        assert!(!queue.is_alive().await);
        assert!(queue.enqueue(json!({})).await.is_err());
    }
}
