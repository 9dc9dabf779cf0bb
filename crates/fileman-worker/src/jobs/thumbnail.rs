//! Thumbnail generation job handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use fileman_core::types::{FileId, UserId};
use fileman_database::{FileFilter, Store};
use fileman_entity::job::{Job, ThumbnailJob};
use fileman_queue::THUMBNAIL_QUEUE;
use fileman_storage::ThumbnailGenerator;

use super::parse_id;
use crate::error::JobError;
use crate::executor::{JobHandler, parse_payload};

/// Generates every configured thumbnail width for an uploaded image.
#[derive(Debug)]
pub struct ThumbnailJobHandler {
    store: Arc<dyn Store>,
    generator: ThumbnailGenerator,
    widths: Vec<u32>,
}

impl ThumbnailJobHandler {
    /// Create the handler.
    pub fn new(store: Arc<dyn Store>, generator: ThumbnailGenerator, widths: Vec<u32>) -> Self {
        Self {
            store,
            generator,
            widths,
        }
    }
}

#[async_trait]
impl JobHandler for ThumbnailJobHandler {
    fn queue(&self) -> &str {
        THUMBNAIL_QUEUE
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: ThumbnailJob = parse_payload(job)?;
        let file_id = payload.file_id().ok_or(JobError::MissingFileId)?;
        let user_id = payload.user_id().ok_or(JobError::MissingUserId)?;
        let file_id: FileId = parse_id("fileId", file_id)?;
        let user_id: UserId = parse_id("userId", user_id)?;

        // A file owned by someone else is reported exactly like a missing one.
        let file = self
            .store
            .files()
            .find_one(&FileFilter::owned(file_id, user_id))
            .await
            .map_err(JobError::Store)?
            .ok_or(JobError::FileNotFound)?;

        info!("Processing file: {}", payload.name.as_deref().unwrap_or(&file.name));

        if file.is_folder() {
            return Err(JobError::NoLocalContent);
        }
        let local_path = file.local_path.as_deref().ok_or(JobError::NoLocalContent)?;
        self.generator
            .generate_all(local_path, &self.widths)
            .await
            .map_err(JobError::Thumbnail)?;
        Ok(())
    }
}
