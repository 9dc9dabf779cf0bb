//! # fileman-queue
//!
//! Job queues for Files Manager. Two named FIFO queues carry work from the
//! HTTP API to the background worker:
//!
//! - **thumbnail_generation**: `{fileId, userId}` payloads
//! - **email_sending**: `{userId}` payloads
//!
//! Each queue is a [`JobQueue`]; the backend is selected at runtime by
//! [`QueueManager`] from configuration.

pub mod manager;
#[cfg(feature = "memory")]
pub mod memory;
pub mod queue;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use manager::QueueManager;
pub use queue::{EMAIL_QUEUE, JobQueue, QueueLimits, QueueStats, THUMBNAIL_QUEUE};
