//! # fileman-storage
//!
//! Local filesystem storage and the thumbnail generator that derives
//! resized copies of uploaded images next to their originals.

pub mod providers;
pub mod thumbnail;

pub use providers::local::LocalStorageProvider;
pub use thumbnail::{ThumbnailGenerator, thumbnail_path};
