//! Store and broker liveness plus entity counters.

use std::sync::Arc;

use fileman_core::result::AppResult;
use fileman_database::Store;
use fileman_queue::QueueManager;

/// Liveness of the two backing services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    /// Queue broker reachable.
    pub redis: bool,
    /// Store reachable.
    pub db: bool,
}

impl SystemStatus {
    /// Both services reachable.
    pub fn is_healthy(&self) -> bool {
        self.redis && self.db
    }
}

/// Entity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStats {
    /// Number of users.
    pub users: u64,
    /// Number of files.
    pub files: u64,
}

/// Reports liveness and counters.
#[derive(Debug, Clone)]
pub struct SystemService {
    store: Arc<dyn Store>,
    queues: QueueManager,
}

impl SystemService {
    /// Creates a new system service.
    pub fn new(store: Arc<dyn Store>, queues: QueueManager) -> Self {
        Self { store, queues }
    }

    /// Check the broker and the store concurrently.
    pub async fn status(&self) -> SystemStatus {
        let (redis, db) = tokio::join!(self.queues.is_alive(), self.store.is_alive());
        SystemStatus { redis, db }
    }

    /// Count users and files.
    pub async fn stats(&self) -> AppResult<SystemStats> {
        let (users, files) = tokio::try_join!(self.store.count_users(), self.store.count_files())?;
        Ok(SystemStats { users, files })
    }
}
