//! # fileman-database
//!
//! Persistent store client for Files Manager. The [`Store`] trait exposes
//! the `users` and `files` collections plus liveness and count queries;
//! [`PostgresStore`] backs it with a sqlx pool and [`MemoryStore`] keeps
//! everything in process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod provider;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use provider::connect_store;
pub use store::{FileFilter, FilesCollection, Store, UserFilter, UsersCollection};
