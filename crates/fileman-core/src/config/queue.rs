//! Job queue broker configuration.

use serde::{Deserialize, Serialize};

/// Job queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue provider: `"redis"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis broker settings.
    #[serde(default)]
    pub redis: RedisQueueConfig,
    /// Seconds a claimed job stays owned by its consumer without a lease
    /// renewal. Past that it counts as stalled and may be handed out again.
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,
    /// Completed jobs kept for inspection; older ones are deleted.
    #[serde(default = "default_keep_finished")]
    pub keep_completed: usize,
    /// Failed jobs kept for inspection; older ones are deleted.
    #[serde(default = "default_keep_finished")]
    pub keep_failed: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisQueueConfig::default(),
            lease_seconds: default_lease_seconds(),
            keep_completed: default_keep_finished(),
            keep_failed: default_keep_finished(),
        }
    }
}

/// Redis broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisQueueConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix for every key the queues write.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisQueueConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "redis".to_string()
}

fn default_lease_seconds() -> u64 {
    300
}

fn default_keep_finished() -> usize {
    1000
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "fileman:".to_string()
}
