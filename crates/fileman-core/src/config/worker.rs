//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether `serve` also runs the worker in process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay in milliseconds between polls of an empty queue.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Attempts per job, including the first. `1` disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay in milliseconds before a retryable failure is requeued.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    /// Milliseconds between scans for claimed jobs whose lease expired.
    #[serde(default = "default_stalled_check_interval")]
    pub stalled_check_interval_ms: u64,
    /// Seconds to wait for in-flight jobs on shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            stalled_check_interval_ms: default_stalled_check_interval(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_backoff() -> u64 {
    2000
}

fn default_stalled_check_interval() -> u64 {
    30_000
}

fn default_shutdown_grace() -> u64 {
    30
}
