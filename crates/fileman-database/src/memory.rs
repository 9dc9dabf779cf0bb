//! In-process store used for tests and single-node development.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use fileman_core::error::AppError;
use fileman_core::result::AppResult;
use fileman_entity::file::{CreateFile, File};
use fileman_entity::user::{CreateUser, User};

use crate::store::{FileFilter, FilesCollection, Store, UserFilter, UsersCollection};

/// Liveness flag shared by the store and its collections.
#[derive(Debug, Clone)]
struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn check(&self) -> AppResult<()> {
        if self.0.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::database("Store is not reachable"))
        }
    }
}

/// In-memory `users` collection.
#[derive(Debug)]
pub struct MemoryUsers {
    rows: RwLock<Vec<User>>,
    alive: Liveness,
}

#[async_trait]
impl UsersCollection for MemoryUsers {
    async fn find_one(&self, filter: &UserFilter) -> AppResult<Option<User>> {
        self.alive.check()?;
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|u| filter.matches(u)).cloned())
    }

    async fn insert_one(&self, data: &CreateUser) -> AppResult<User> {
        self.alive.check()?;
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.email == data.email) {
            return Err(AppError::conflict(format!(
                "Email '{}' already exists",
                data.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            password: data.password_hash.clone(),
            created_at: Utc::now(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn count(&self) -> AppResult<u64> {
        self.alive.check()?;
        Ok(self.rows.read().await.len() as u64)
    }
}

/// In-memory `files` collection.
#[derive(Debug)]
pub struct MemoryFiles {
    rows: RwLock<Vec<File>>,
    alive: Liveness,
}

#[async_trait]
impl FilesCollection for MemoryFiles {
    async fn find_one(&self, filter: &FileFilter) -> AppResult<Option<File>> {
        self.alive.check()?;
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|f| filter.matches(f)).cloned())
    }

    async fn insert_one(&self, data: &CreateFile) -> AppResult<File> {
        self.alive.check()?;
        let file = File {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            name: data.name.clone(),
            file_type: data.file_type,
            is_public: data.is_public,
            parent_id: data.parent_id,
            local_path: data.local_path.clone(),
            created_at: Utc::now(),
        };
        self.rows.write().await.push(file.clone());
        Ok(file)
    }

    async fn count(&self) -> AppResult<u64> {
        self.alive.check()?;
        Ok(self.rows.read().await.len() as u64)
    }
}

/// [`Store`] kept entirely in process memory.
///
/// Clones share the same collections. [`MemoryStore::set_alive`] simulates
/// an outage: while down, `is_alive` reports false and every collection
/// call fails with a database error.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    users: Arc<MemoryUsers>,
    files: Arc<MemoryFiles>,
    alive: Liveness,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let alive = Liveness(Arc::new(AtomicBool::new(true)));
        Self {
            users: Arc::new(MemoryUsers {
                rows: RwLock::new(Vec::new()),
                alive: alive.clone(),
            }),
            files: Arc::new(MemoryFiles {
                rows: RwLock::new(Vec::new()),
                alive: alive.clone(),
            }),
            alive,
        }
    }

    /// Mark the store reachable or unreachable.
    pub fn set_alive(&self, alive: bool) {
        self.alive.0.store(alive, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    fn users(&self) -> Arc<dyn UsersCollection> {
        self.users.clone()
    }

    fn files(&self) -> Arc<dyn FilesCollection> {
        self.files.clone()
    }

    async fn is_alive(&self) -> bool {
        self.alive.0.load(Ordering::SeqCst)
    }
}
