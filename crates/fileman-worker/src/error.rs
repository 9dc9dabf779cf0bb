//! Job failure taxonomy.

use fileman_core::error::AppError;

/// Why a job failed.
///
/// Every variant is local to one job; none stops the consumer loop.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Thumbnail payload without a `fileId`.
    #[error("Missing fileId")]
    MissingFileId,

    /// Payload without a `userId`.
    #[error("Missing userId")]
    MissingUserId,

    /// Payload is not an object of the expected shape.
    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    /// An id field is not a valid identifier.
    #[error("Invalid {field}: {value}")]
    InvalidId {
        /// Payload field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// No file with this id is owned by this user.
    #[error("File not found")]
    FileNotFound,

    /// No user with this id.
    #[error("User not found")]
    UserNotFound,

    /// The file entry has no content on disk (a folder).
    #[error("File has no local content")]
    NoLocalContent,

    /// Reading, resizing or writing a thumbnail failed.
    #[error(transparent)]
    Thumbnail(AppError),

    /// The mail provider failed.
    #[error(transparent)]
    Mail(AppError),

    /// The store lookup failed.
    #[error(transparent)]
    Store(AppError),
}

impl JobError {
    /// Whether another attempt could succeed. Validation and lookup
    /// failures are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Thumbnail(_) | Self::Mail(_) | Self::Store(_))
    }
}
