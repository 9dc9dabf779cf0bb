//! Redis-backed job queue.
//!
//! Key layout per queue (all under the configured prefix):
//!
//! - `<queue>:wait` list of waiting job ids, pushed left and claimed right
//! - `<queue>:active` list of claimed job ids, newest claim left
//! - `<queue>:leases` hash of claimed job id to lease expiry (epoch ms)
//! - `<queue>:completed`, `<queue>:failed` lists of finished job ids,
//!   newest left
//! - `<queue>:jobs` hash of job id to the JSON-encoded job
//!
//! Every transition that touches the active list runs as one Lua script,
//! so a job is never lost between lists and a consumer whose claim was
//! recovered cannot finish the job a second time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use tracing::{debug, error, info};
use uuid::Uuid;

use fileman_core::error::{AppError, ErrorKind};
use fileman_core::result::AppResult;
use fileman_entity::job::Job;

use super::client::RedisClient;
use crate::queue::{JobQueue, QueueLimits, QueueStats};

/// Lua script for an atomic claim.
///
/// KEYS[1] = wait list
/// KEYS[2] = active list
/// KEYS[3] = leases hash
/// ARGV[1] = lease expiry (epoch ms)
///
/// Returns the claimed id, or nil when the queue is empty.
const CLAIM_SCRIPT: &str = r#"
    local id = redis.call('LMOVE', KEYS[1], KEYS[2], 'RIGHT', 'LEFT')
    if not id then
        return false
    end
    redis.call('HSET', KEYS[3], id, ARGV[1])
    return id
"#;

/// Lua script that moves a claimed job out of the active list onto the
/// left end of a target list.
///
/// KEYS[1] = active list
/// KEYS[2] = leases hash
/// KEYS[3] = jobs hash
/// KEYS[4] = target list
/// ARGV[1] = job id
/// ARGV[2] = encoded job
/// ARGV[3] = entries kept in the target list, -1 for all
///
/// Returns:
///   1 = moved
///   0 = not claimed, nothing changed
const FINISH_SCRIPT: &str = r#"
    local id = ARGV[1]
    if redis.call('LREM', KEYS[1], 1, id) == 0 then
        return 0
    end
    redis.call('HDEL', KEYS[2], id)
    redis.call('HSET', KEYS[3], id, ARGV[2])
    redis.call('LPUSH', KEYS[4], id)

    local keep = tonumber(ARGV[3])
    if keep >= 0 then
        while redis.call('LLEN', KEYS[4]) > keep do
            local old = redis.call('RPOP', KEYS[4])
            redis.call('HDEL', KEYS[3], old)
        end
    end
    return 1
"#;

/// Lua script that renews a lease.
///
/// KEYS[1] = leases hash
/// ARGV[1] = job id
/// ARGV[2] = new lease expiry (epoch ms)
///
/// Returns 1 when renewed, 0 when the job is no longer claimed.
const EXTEND_SCRIPT: &str = r#"
    if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 0 then
        return 0
    end
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
"#;

/// Lua script that returns one expired claim to the head of the wait list.
///
/// KEYS[1] = active list
/// KEYS[2] = leases hash
/// KEYS[3] = jobs hash
/// KEYS[4] = wait list
/// ARGV[1] = job id
/// ARGV[2] = now (epoch ms)
/// ARGV[3] = encoded requeued job, empty when the record is gone
///
/// Returns:
///   1 = recovered
///   0 = lease still valid or no longer claimed
///  -1 = id without a job record, dropped
const RECOVER_SCRIPT: &str = r#"
    local id = ARGV[1]
    local expires = redis.call('HGET', KEYS[2], id)
    if expires and tonumber(expires) > tonumber(ARGV[2]) then
        return 0
    end
    if redis.call('LREM', KEYS[1], 1, id) == 0 then
        return 0
    end
    redis.call('HDEL', KEYS[2], id)
    if ARGV[3] == '' then
        return -1
    end
    redis.call('HSET', KEYS[3], id, ARGV[3])
    redis.call('RPUSH', KEYS[4], id)
    return 1
"#;

/// Fully prefixed keys of one queue.
#[derive(Debug, Clone)]
struct QueueKeys {
    wait: String,
    active: String,
    leases: String,
    completed: String,
    failed: String,
    jobs: String,
}

impl QueueKeys {
    fn new(client: &RedisClient, name: &str) -> Self {
        Self {
            wait: client.prefixed_key(&format!("{name}:wait")),
            active: client.prefixed_key(&format!("{name}:active")),
            leases: client.prefixed_key(&format!("{name}:leases")),
            completed: client.prefixed_key(&format!("{name}:completed")),
            failed: client.prefixed_key(&format!("{name}:failed")),
            jobs: client.prefixed_key(&format!("{name}:jobs")),
        }
    }
}

/// Epoch milliseconds `after` from now.
fn expiry_ms(after: Duration) -> i64 {
    Utc::now().timestamp_millis() + after.as_millis() as i64
}

/// Retention count passed to [`FINISH_SCRIPT`]; `None` keeps everything.
fn keep_arg(keep: Option<usize>) -> i64 {
    keep.map_or(-1, |k| k as i64)
}

/// Redis-backed [`JobQueue`].
#[derive(Debug, Clone)]
pub struct RedisJobQueue {
    client: RedisClient,
    name: String,
    keys: QueueKeys,
    max_attempts: u32,
    limits: QueueLimits,
}

impl RedisJobQueue {
    /// Create a queue handle over a shared client with default limits.
    pub fn new(client: RedisClient, name: impl Into<String>, max_attempts: u32) -> Self {
        let name = name.into();
        let keys = QueueKeys::new(&client, &name);
        Self {
            client,
            name,
            keys,
            max_attempts,
            limits: QueueLimits::default(),
        }
    }

    /// Replace the lease and retention limits.
    pub fn with_limits(mut self, limits: QueueLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Queue, format!("Redis error: {e}"), e)
    }

    async fn load(&self, id: &str) -> AppResult<Option<Job>> {
        let mut conn = self.client.conn_mut();
        let raw: Option<String> = conn
            .hget(&self.keys.jobs, id)
            .await
            .map_err(Self::map_err)?;
        raw.map(|r| serde_json::from_str(&r).map_err(AppError::from))
            .transpose()
    }

    /// Store the job and move its id from the active list to `target`.
    /// `false` when the job is no longer claimed.
    async fn finish(&self, job: &Job, target: &str, keep: Option<usize>) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let moved: i64 = redis::Script::new(FINISH_SCRIPT)
            .key(&self.keys.active)
            .key(&self.keys.leases)
            .key(&self.keys.jobs)
            .key(target)
            .arg(job.id.to_string())
            .arg(serde_json::to_string(job)?)
            .arg(keep_arg(keep))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(moved == 1)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn lease(&self) -> Duration {
        self.limits.lease
    }

    async fn enqueue(&self, payload: serde_json::Value) -> AppResult<Job> {
        let job = Job::new(self.name.clone(), payload, self.max_attempts);
        let id = job.id.to_string();
        let encoded = serde_json::to_string(&job)?;
        let mut conn = self.client.conn_mut();

        redis::pipe()
            .atomic()
            .hset(&self.keys.jobs, &id, encoded)
            .ignore()
            .lpush(&self.keys.wait, &id)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(queue = %self.name, job_id = %id, "Job enqueued");
        Ok(job)
    }

    async fn dequeue(&self) -> AppResult<Option<Job>> {
        let mut conn = self.client.conn_mut();
        loop {
            let id: Option<String> = redis::Script::new(CLAIM_SCRIPT)
                .key(&self.keys.wait)
                .key(&self.keys.active)
                .key(&self.keys.leases)
                .arg(expiry_ms(self.limits.lease))
                .invoke_async(&mut conn)
                .await
                .map_err(Self::map_err)?;

            let Some(id) = id else {
                return Ok(None);
            };

            let Some(mut job) = self.load(&id).await? else {
                // Id without a job record; drop it and try the next one.
                redis::pipe()
                    .atomic()
                    .lrem(&self.keys.active, 1, &id)
                    .ignore()
                    .hdel(&self.keys.leases, &id)
                    .ignore()
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(Self::map_err)?;
                continue;
            };

            job.mark_processing();
            let encoded = serde_json::to_string(&job)?;
            let _: i64 = conn
                .hset(&self.keys.jobs, &id, encoded)
                .await
                .map_err(Self::map_err)?;
            return Ok(Some(job));
        }
    }

    async fn complete(&self, job: &mut Job) -> AppResult<bool> {
        let mut done = job.clone();
        done.mark_completed();
        let keep = Some(self.limits.keep_completed);
        let moved = self.finish(&done, &self.keys.completed, keep).await?;
        if moved {
            *job = done;
        }
        Ok(moved)
    }

    async fn fail(&self, job: &mut Job, error: &str) -> AppResult<bool> {
        let mut done = job.clone();
        done.mark_failed(error);
        let keep = Some(self.limits.keep_failed);
        let moved = self.finish(&done, &self.keys.failed, keep).await?;
        if moved {
            *job = done;
        }
        Ok(moved)
    }

    async fn requeue(&self, job: &mut Job) -> AppResult<bool> {
        let mut next = job.clone();
        next.mark_requeued();
        let moved = self.finish(&next, &self.keys.wait, None).await?;
        if moved {
            *job = next;
        }
        Ok(moved)
    }

    async fn extend_lease(&self, job: &Job) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let renewed: i64 = redis::Script::new(EXTEND_SCRIPT)
            .key(&self.keys.leases)
            .arg(job.id.to_string())
            .arg(expiry_ms(self.limits.lease))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(renewed == 1)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Job>> {
        self.load(&id.to_string()).await
    }

    async fn stats(&self) -> AppResult<QueueStats> {
        let mut conn = self.client.conn_mut();
        let (waiting, active, completed, failed): (u64, u64, u64, u64) = redis::pipe()
            .llen(&self.keys.wait)
            .llen(&self.keys.active)
            .llen(&self.keys.completed)
            .llen(&self.keys.failed)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(QueueStats {
            waiting,
            active,
            completed,
            failed,
        })
    }

    async fn recover_stalled(&self) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let ids: Vec<String> = conn
            .lrange(&self.keys.active, 0, -1)
            .await
            .map_err(Self::map_err)?;

        // The active list is newest-first; pushing oldest last keeps the
        // original claim order at the head of the wait list.
        let now = Utc::now().timestamp_millis();
        let mut recovered = 0u64;
        for id in &ids {
            let encoded = match self.load(id).await? {
                Some(mut job) => {
                    job.mark_requeued();
                    serde_json::to_string(&job)?
                }
                None => String::new(),
            };

            let result: i64 = redis::Script::new(RECOVER_SCRIPT)
                .key(&self.keys.active)
                .key(&self.keys.leases)
                .key(&self.keys.jobs)
                .key(&self.keys.wait)
                .arg(id)
                .arg(now)
                .arg(encoded)
                .invoke_async(&mut conn)
                .await
                .map_err(Self::map_err)?;

            match result {
                1 => recovered += 1,
                0 => {}
                -1 => debug!(queue = %self.name, job_id = %id, "Dropped claim without a job record"),
                other => error!(result = other, "Unexpected Lua script result"),
            }
        }

        if recovered > 0 {
            info!(queue = %self.name, count = recovered, "Recovered stalled jobs");
        }
        Ok(recovered)
    }

    async fn is_alive(&self) -> bool {
        self.client.ping().await
    }
}
