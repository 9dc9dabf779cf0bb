//! Store traits shared by the PostgreSQL and in-memory implementations.
//!
//! A [`Store`] is created once at startup and handed to every consumer as
//! an `Arc<dyn Store>`; nothing reaches for a global connection.

use std::sync::Arc;

use async_trait::async_trait;

use fileman_core::result::AppResult;
use fileman_core::types::{FileId, UserId};
use fileman_entity::file::{CreateFile, File};
use fileman_entity::user::{CreateUser, User};

/// Filter for looking up a single user. Set fields are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Match on primary key.
    pub id: Option<UserId>,
    /// Match on exact email address.
    pub email: Option<String>,
}

impl UserFilter {
    /// Filter on the user id.
    pub fn by_id(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Filter on the email address.
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Whether a user satisfies this filter.
    pub fn matches(&self, user: &User) -> bool {
        self.id.is_none_or(|id| id.into_uuid() == user.id)
            && self.email.as_deref().is_none_or(|email| email == user.email)
    }
}

/// Filter for looking up a single file. Set fields are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    /// Match on primary key.
    pub id: Option<FileId>,
    /// Match on owner.
    pub user_id: Option<UserId>,
}

impl FileFilter {
    /// Filter on the file id.
    pub fn by_id(id: FileId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Filter on a file id owned by a specific user. A file owned by
    /// someone else does not match.
    pub fn owned(id: FileId, user_id: UserId) -> Self {
        Self {
            id: Some(id),
            user_id: Some(user_id),
        }
    }

    /// Whether a file satisfies this filter.
    pub fn matches(&self, file: &File) -> bool {
        self.id.is_none_or(|id| id.into_uuid() == file.id)
            && self.user_id.is_none_or(|uid| uid.into_uuid() == file.user_id)
    }
}

/// The `users` collection.
#[async_trait]
pub trait UsersCollection: Send + Sync + std::fmt::Debug {
    /// Return the first user matching the filter.
    async fn find_one(&self, filter: &UserFilter) -> AppResult<Option<User>>;

    /// Insert a user. Fails with a conflict if the email is taken.
    async fn insert_one(&self, data: &CreateUser) -> AppResult<User>;

    /// Count all users.
    async fn count(&self) -> AppResult<u64>;
}

/// The `files` collection.
#[async_trait]
pub trait FilesCollection: Send + Sync + std::fmt::Debug {
    /// Return the first file matching the filter.
    async fn find_one(&self, filter: &FileFilter) -> AppResult<Option<File>>;

    /// Insert a file entry.
    async fn insert_one(&self, data: &CreateFile) -> AppResult<File>;

    /// Count all files.
    async fn count(&self) -> AppResult<u64>;
}

/// Persistent store client.
#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g. "postgres").
    fn provider_type(&self) -> &str;

    /// Handle to the `users` collection.
    fn users(&self) -> Arc<dyn UsersCollection>;

    /// Handle to the `files` collection.
    fn files(&self) -> Arc<dyn FilesCollection>;

    /// Whether the store is currently reachable.
    async fn is_alive(&self) -> bool;

    /// Number of users.
    async fn count_users(&self) -> AppResult<u64> {
        self.users().count().await
    }

    /// Number of files.
    async fn count_files(&self) -> AppResult<u64> {
        self.files().count().await
    }
}
