//! Thumbnail generation.

pub mod generator;

pub use generator::{ThumbnailGenerator, thumbnail_path};
