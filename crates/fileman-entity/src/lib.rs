//! # fileman-entity
//!
//! Domain entity models for Files Manager. Every struct in this crate
//! represents a database row or a value carried through a job queue.
//! Database entities additionally derive `sqlx::FromRow`.

pub mod file;
pub mod job;
pub mod user;
