use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Vector-store configuration. The store owns a directory and keeps its
/// database file inside it, independent from the graph database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Directory holding the vector store.
    pub dir: PathBuf,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("vectors"),
        }
    }
}
