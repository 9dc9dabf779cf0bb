//! Request DTOs.

use serde::Deserialize;

use fileman_service::NewUser;

/// `POST /users` body. Fields are optional so that a missing one can be
/// reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext password.
    #[serde(default)]
    pub password: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
        }
    }
}
