//! Liveness and counters.

pub mod service;

pub use service::{SystemService, SystemStats, SystemStatus};
