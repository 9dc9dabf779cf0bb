//! Core traits defined in `fileman-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
