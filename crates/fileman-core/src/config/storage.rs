//! Local storage and thumbnail configuration.

use serde::{Deserialize, Serialize};

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that relative file paths are resolved against.
    #[serde(default = "default_root")]
    pub root: String,
    /// Thumbnail widths generated for every uploaded image.
    #[serde(default = "default_thumbnail_sizes")]
    pub thumbnail_sizes: Vec<u32>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            thumbnail_sizes: default_thumbnail_sizes(),
        }
    }
}

fn default_root() -> String {
    "/tmp/files_manager".to_string()
}

fn default_thumbnail_sizes() -> Vec<u32> {
    vec![500, 250, 100]
}
