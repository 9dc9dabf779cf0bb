//! PostgreSQL-backed store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::DatabasePool;
use crate::repositories::{FileRepository, UserRepository};
use crate::store::{FilesCollection, Store, UsersCollection};

/// [`Store`] implementation over a shared sqlx pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: DatabasePool,
    users: Arc<UserRepository>,
    files: Arc<FileRepository>,
}

impl PostgresStore {
    /// Build the store from an already connected pool.
    pub fn new(pool: DatabasePool) -> Self {
        let users = Arc::new(UserRepository::new(pool.pool().clone()));
        let files = Arc::new(FileRepository::new(pool.pool().clone()));
        Self { pool, users, files }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn provider_type(&self) -> &str {
        "postgres"
    }

    fn users(&self) -> Arc<dyn UsersCollection> {
        self.users.clone()
    }

    fn files(&self) -> Arc<dyn FilesCollection> {
        self.files.clone()
    }

    async fn is_alive(&self) -> bool {
        self.pool.is_alive().await
    }
}
