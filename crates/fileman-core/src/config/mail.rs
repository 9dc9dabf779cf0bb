//! Outgoing mail configuration.

use serde::{Deserialize, Serialize};

/// SMTP mail provider configuration.
///
/// An empty `smtp_host` puts the mailer in log-only mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Use STARTTLS instead of implicit TLS.
    #[serde(default = "default_true")]
    pub use_starttls: bool,
    /// Sender mailbox, e.g. `Files Manager <no-reply@example.com>`.
    #[serde(default = "default_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            use_starttls: default_true(),
            from: default_from(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_from() -> String {
    "Files Manager <no-reply@files-manager.local>".to_string()
}
