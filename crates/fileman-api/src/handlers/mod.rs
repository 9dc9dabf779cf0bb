//! Route handlers organized by domain.

pub mod app;
pub mod user;
