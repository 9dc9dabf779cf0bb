//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fileman_service::{SystemStats, SystemStatus};

/// `GET /status` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Queue broker reachable.
    pub redis: bool,
    /// Store reachable.
    pub db: bool,
}

impl From<SystemStatus> for StatusResponse {
    fn from(status: SystemStatus) -> Self {
        Self {
            redis: status.redis,
            db: status.db,
        }
    }
}

/// `GET /stats` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of users.
    pub users: u64,
    /// Number of files.
    pub files: u64,
}

impl From<SystemStats> for StatsResponse {
    fn from(stats: SystemStats) -> Self {
        Self {
            users: stats.users,
            files: stats.files,
        }
    }
}

/// `POST /users` body on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    /// New user id.
    pub id: Uuid,
    /// Registered email address.
    pub email: String,
}
