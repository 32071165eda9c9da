use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Graph-store (relational) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the graph database file.
    pub db_path: PathBuf,
    /// Number of read-only connections in the pool.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("engram.db"),
            read_pool_size: 4,
        }
    }
}
