//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::{info, warn};

use fileman_core::config::RedisQueueConfig;
use fileman_core::error::{AppError, ErrorKind};
use fileman_core::result::AppResult;
use fileman_core::types::url::mask_password;

/// Redis client wrapper with connection management.
#[derive(Debug, Clone)]
pub struct RedisClient {
    /// Redis connection manager (multiplexed, reconnecting).
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
}

impl RedisClient {
    /// Create a new Redis client from configuration.
    pub async fn connect(config: &RedisQueueConfig) -> AppResult<Self> {
        info!(url = %mask_password(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to connect to Redis", e)
        })?;

        info!("Successfully connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Get a mutable clone of the connection manager.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Send a `PING`. Any error counts as not alive.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn_mut();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(pong) => pong == "PONG",
            Err(e) => {
                warn!(error = %e, "Redis liveness check failed");
                false
            }
        }
    }
}
