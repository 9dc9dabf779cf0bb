//! Mail sender trait.

use async_trait::async_trait;

use fileman_core::result::AppResult;

use crate::message::MailMessage;

/// Sends one message synchronously with respect to the caller.
///
/// Implementations do not retry or queue; a failed send is returned to
/// the caller as an error.
#[async_trait]
pub trait MailSender: Send + Sync + std::fmt::Debug {
    /// Deliver a message.
    async fn send(&self, message: &MailMessage) -> AppResult<()>;
}
