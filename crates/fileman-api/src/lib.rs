//! # fileman-api
//!
//! HTTP API layer for Files Manager built on Axum.
//!
//! Provides the status, stats and user registration endpoints, request
//! logging and CORS middleware, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;
