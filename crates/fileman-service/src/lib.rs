//! # fileman-service
//!
//! Business logic service layer for Files Manager. Each service
//! orchestrates the store, the job queues and password hashing to
//! implement one application-level use case.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod system;
pub mod user;

pub use system::{SystemService, SystemStats, SystemStatus};
pub use user::{NewUser, UserService};
