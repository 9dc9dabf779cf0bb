//! Core type definitions used across the workspace.

pub mod id;
pub mod url;

pub use id::*;
