//! SMTP mail sender.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, warn};

use fileman_core::config::MailConfig;
use fileman_core::error::{AppError, ErrorKind};
use fileman_core::result::AppResult;

use crate::message::MailMessage;
use crate::sender::MailSender;

/// SMTP transport wrapper.
///
/// With an empty `smtp_host` the mailer runs in no-op mode: messages are
/// still built and validated, then logged instead of sent.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("enabled", &self.is_enabled())
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl SmtpMailer {
    /// Build the mailer from configuration.
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let from = config.from.parse::<Mailbox>().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid mail sender address", e)
        })?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to configure SMTP transport",
                    e,
                )
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mailer configured");
            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Whether messages are actually delivered.
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Build the MIME message for a [`MailMessage`].
    pub fn build_message(&self, message: &MailMessage) -> AppResult<Message> {
        let to = message.to.parse::<Mailbox>().map_err(|e| {
            AppError::with_source(
                ErrorKind::Mail,
                format!("Invalid recipient address: {}", message.to),
                e,
            )
        })?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(header::ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .map_err(|e| AppError::with_source(ErrorKind::Mail, "Failed to build email message", e))
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        let email = self.build_message(message)?;

        match &self.transport {
            Some(transport) => {
                transport.send(email).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Mail, format!("Failed to send email: {e}"), e)
                })?;
                info!(subject = %message.subject, "Email sent");
            }
            None => {
                info!(
                    subject = %message.subject,
                    recipient = %message.to,
                    "Mailer running in no-op mode; skipping actual send"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_host_is_noop() {
        let mailer = SmtpMailer::new(&MailConfig::default()).unwrap();
        assert!(!mailer.is_enabled());
    }

    #[test]
    fn test_invalid_from_is_configuration_error() {
        let config = MailConfig {
            from: "not an address".to_string(),
            ..MailConfig::default()
        };
        let err = SmtpMailer::new(&config).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_build_message_is_html() {
        let mailer = SmtpMailer::new(&MailConfig::default()).unwrap();
        let message = MailMessage::new("ada@example.com", "Hi", "<p>hello</p>");
        let built = mailer.build_message(&message).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Subject: Hi"));
    }

    #[tokio::test]
    async fn test_noop_send_still_validates_recipient() {
        let mailer = SmtpMailer::new(&MailConfig::default()).unwrap();
        mailer
            .send(&MailMessage::new("ada@example.com", "Hi", "<p>hello</p>"))
            .await
            .unwrap();

        let err = mailer
            .send(&MailMessage::new("nobody", "Hi", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Mail);
    }
}
