//! Store construction from configuration.

use std::sync::Arc;

use tracing::info;

use fileman_core::config::DatabaseConfig;
use fileman_core::error::AppError;
use fileman_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::migration::run_migrations;
use crate::postgres::PostgresStore;
use crate::store::Store;

/// Connect the configured store provider.
///
/// For `"postgres"` the pool is opened and pending migrations are applied
/// before the store is returned.
pub async fn connect_store(config: &DatabaseConfig) -> AppResult<Arc<dyn Store>> {
    match config.provider.as_str() {
        "postgres" => {
            info!("Initializing PostgreSQL store");
            let pool = DatabasePool::connect(config).await?;
            run_migrations(pool.pool()).await?;
            Ok(Arc::new(PostgresStore::new(pool)))
        }
        "memory" => {
            info!("Initializing in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        other => Err(AppError::configuration(format!(
            "Unknown database provider: '{other}'. Supported: postgres, memory"
        ))),
    }
}
