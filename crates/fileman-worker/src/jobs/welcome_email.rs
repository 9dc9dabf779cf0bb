//! Welcome email job handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use fileman_core::types::UserId;
use fileman_database::{Store, UserFilter};
use fileman_entity::job::{EmailJob, Job};
use fileman_mail::{MailSender, template};
use fileman_queue::EMAIL_QUEUE;

use super::parse_id;
use crate::error::JobError;
use crate::executor::{JobHandler, parse_payload};

/// Sends the welcome email to a newly registered user.
#[derive(Debug)]
pub struct WelcomeEmailJobHandler {
    store: Arc<dyn Store>,
    mailer: Arc<dyn MailSender>,
}

impl WelcomeEmailJobHandler {
    /// Create the handler.
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn MailSender>) -> Self {
        Self { store, mailer }
    }
}

#[async_trait]
impl JobHandler for WelcomeEmailJobHandler {
    fn queue(&self) -> &str {
        EMAIL_QUEUE
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: EmailJob = parse_payload(job)?;
        let user_id = payload.user_id().ok_or(JobError::MissingUserId)?;
        let user_id: UserId = parse_id("userId", user_id)?;

        let user = self
            .store
            .users()
            .find_one(&UserFilter::by_id(user_id))
            .await
            .map_err(JobError::Store)?
            .ok_or(JobError::UserNotFound)?;

        info!("Sending welcome email to {}", user.email);
        self.mailer
            .send(&template::welcome(&user.email))
            .await
            .map_err(JobError::Mail)
    }
}
