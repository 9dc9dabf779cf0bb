//! # fileman-mail
//!
//! Outgoing mail for Files Manager. [`MailSender`] is the seam the worker
//! depends on; [`SmtpMailer`] delivers through an SMTP relay with
//! [lettre](https://crates.io/crates/lettre), or only logs when no relay
//! is configured.

pub mod message;
pub mod sender;
pub mod smtp;
pub mod template;

pub use message::MailMessage;
pub use sender::MailSender;
pub use smtp::SmtpMailer;
