//! Fixed mail templates.

use crate::message::MailMessage;

/// Subject of the welcome email.
pub const WELCOME_SUBJECT: &str = "Welcome to ALX-Files_Manager by B3zaleel";

/// Welcome email for a newly registered user.
pub fn welcome(email: &str) -> MailMessage {
    let body = format!(
        "<div><h3>Hello {email},</h3>\
         <p>Welcome to ALX-Files_Manager, a simple file management API built with \
         Node.js by Bezaleel Olakunori. We hope it meets your needs.</p></div>"
    );
    MailMessage::new(email, WELCOME_SUBJECT, body)
}
