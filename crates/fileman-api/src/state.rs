//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use fileman_auth::PasswordHasher;
use fileman_core::config::AppConfig;
use fileman_database::Store;
use fileman_queue::QueueManager;
use fileman_service::{SystemService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped or cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Persistent store
    pub store: Arc<dyn Store>,
    /// Job queues
    pub queues: QueueManager,
    /// User registration
    pub user_service: Arc<UserService>,
    /// Liveness and counters
    pub system_service: Arc<SystemService>,
}

impl AppState {
    /// Build the state and its services from the shared handles.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn Store>, queues: QueueManager) -> Self {
        let user_service = Arc::new(UserService::new(
            Arc::clone(&store),
            queues.clone(),
            Arc::new(PasswordHasher::new()),
        ));
        let system_service = Arc::new(SystemService::new(Arc::clone(&store), queues.clone()));

        Self {
            config,
            store,
            queues,
            user_service,
            system_service,
        }
    }
}
