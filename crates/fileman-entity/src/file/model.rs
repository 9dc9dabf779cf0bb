//! File entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of entry stored in the files table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// A folder; has no content on disk.
    Folder,
    /// A regular file.
    File,
    /// An image; thumbnails are generated for these.
    Image,
}

impl FileType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file or folder owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Entry kind.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Whether the file is publicly readable.
    pub is_public: bool,
    /// Parent folder, `None` for the root.
    pub parent_id: Option<Uuid>,
    /// Absolute path of the content on local disk. `None` for folders.
    pub local_path: Option<String>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
}

impl File {
    /// Check if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }
}

/// Data required to create a new file entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The owning user.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Entry kind.
    pub file_type: FileType,
    /// Whether the file is publicly readable.
    pub is_public: bool,
    /// Parent folder.
    pub parent_id: Option<Uuid>,
    /// Absolute path of the content on local disk.
    pub local_path: Option<String>,
}
