//! Queue manager that builds both queues from the configured provider.

use std::sync::Arc;

use tracing::info;

use fileman_core::config::QueueConfig;
use fileman_core::error::AppError;
use fileman_core::result::AppResult;

use crate::queue::{EMAIL_QUEUE, JobQueue, QueueLimits, THUMBNAIL_QUEUE};

/// Holds the thumbnail and email queues.
///
/// The provider is selected at construction time based on configuration.
/// Both queues share one broker connection.
#[derive(Debug, Clone)]
pub struct QueueManager {
    thumbnail: Arc<dyn JobQueue>,
    email: Arc<dyn JobQueue>,
}

impl QueueManager {
    /// Connect the configured provider. `max_attempts` is stamped on every
    /// enqueued job.
    pub async fn new(config: &QueueConfig, max_attempts: u32) -> AppResult<Self> {
        let limits = QueueLimits::from_config(config);
        match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis job queues");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Ok(Self::from_queues(
                    Arc::new(
                        crate::redis::RedisJobQueue::new(
                            client.clone(),
                            THUMBNAIL_QUEUE,
                            max_attempts,
                        )
                        .with_limits(limits),
                    ),
                    Arc::new(
                        crate::redis::RedisJobQueue::new(client, EMAIL_QUEUE, max_attempts)
                            .with_limits(limits),
                    ),
                ))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory job queues");
                Ok(Self::in_memory_with(max_attempts, limits))
            }
            other => Err(AppError::configuration(format!(
                "Unknown queue provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }

    /// Build a manager from existing queues (for testing).
    pub fn from_queues(thumbnail: Arc<dyn JobQueue>, email: Arc<dyn JobQueue>) -> Self {
        Self { thumbnail, email }
    }

    /// Build a manager over fresh in-memory queues.
    #[cfg(feature = "memory")]
    pub fn in_memory(max_attempts: u32) -> Self {
        Self::in_memory_with(max_attempts, QueueLimits::default())
    }

    /// Build a manager over fresh in-memory queues with explicit limits.
    #[cfg(feature = "memory")]
    pub fn in_memory_with(max_attempts: u32, limits: QueueLimits) -> Self {
        use crate::memory::MemoryJobQueue;
        Self::from_queues(
            Arc::new(MemoryJobQueue::new(THUMBNAIL_QUEUE, max_attempts).with_limits(limits)),
            Arc::new(MemoryJobQueue::new(EMAIL_QUEUE, max_attempts).with_limits(limits)),
        )
    }

    /// The thumbnail generation queue.
    pub fn thumbnail(&self) -> Arc<dyn JobQueue> {
        self.thumbnail.clone()
    }

    /// The welcome email queue.
    pub fn email(&self) -> Arc<dyn JobQueue> {
        self.email.clone()
    }

    /// Both queues, thumbnail first.
    pub fn all(&self) -> Vec<Arc<dyn JobQueue>> {
        vec![self.thumbnail.clone(), self.email.clone()]
    }

    /// Whether the broker is reachable. Both queues must answer.
    pub async fn is_alive(&self) -> bool {
        self.thumbnail.is_alive().await && self.email.is_alive().await
    }
}
