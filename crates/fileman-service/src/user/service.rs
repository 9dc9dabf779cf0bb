//! User registration: validation, hashing, storage and the welcome job.

use std::sync::Arc;

use tracing::{info, warn};
use validator::ValidateEmail;

use fileman_auth::password::PasswordHasher;
use fileman_core::error::{AppError, ErrorKind};
use fileman_database::{Store, UserFilter};
use fileman_entity::job::EmailJob;
use fileman_entity::user::{CreateUser, User};
use fileman_queue::QueueManager;

/// Registration input as received from a client. Both fields may be absent.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Email address.
    pub email: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

/// Handles user registration.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    queues: QueueManager,
    hasher: Arc<PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(store: Arc<dyn Store>, queues: QueueManager, hasher: Arc<PasswordHasher>) -> Self {
        Self {
            store,
            queues,
            hasher,
        }
    }

    /// Register a user and queue their welcome email.
    ///
    /// Checks run in order: email present, password present, email well
    /// formed, email unused. Every failure is a validation error whose
    /// message is returned to the client verbatim.
    pub async fn register(&self, input: NewUser) -> Result<User, AppError> {
        let email = input
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::validation("Missing email"))?;
        let password = input
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::validation("Missing password"))?;
        if !email.validate_email() {
            return Err(AppError::validation("Invalid email"));
        }

        let users = self.store.users();
        if users.find_one(&UserFilter::by_email(email)).await?.is_some() {
            return Err(AppError::validation("Already exist"));
        }

        let password_hash = self.hasher.hash_password(password)?;
        let user = users
            .insert_one(&CreateUser {
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => AppError::validation("Already exist"),
                _ => e,
            })?;

        info!(user_id = %user.id, "User registered");

        let payload = serde_json::to_value(EmailJob::new(user.id.to_string()))?;
        if let Err(e) = self.queues.email().enqueue(payload).await {
            warn!(user_id = %user.id, error = %e, "Failed to queue welcome email");
        }

        Ok(user)
    }
}
