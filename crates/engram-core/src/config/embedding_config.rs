use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::LOCAL_EMBEDDING_DIM;

/// Embedding collaborator configuration.
///
/// `provider` selects the backend: `local` (HTTP to a local model server,
/// 384 dims), `remote` (hosted HTTP API, 1536 dims), or `mock`
/// (CSPRNG vectors — tests only, never a silent fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    /// Endpoint URL for the HTTP providers.
    pub endpoint: String,
    /// Bearer token for the remote provider, if required.
    pub api_key: Option<String>,
    /// Expected embedding dimension; responses of any other width fail.
    pub dimensions: usize,
    /// Max entries in the in-memory L1 cache.
    pub l1_cache_entries: u64,
    /// Directory of the content-addressed L2 disk cache.
    pub cache_dir: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            endpoint: "http://127.0.0.1:8876/embed".to_string(),
            api_key: None,
            dimensions: LOCAL_EMBEDDING_DIM,
            l1_cache_entries: 10_000,
            cache_dir: PathBuf::from("embedding-cache"),
        }
    }
}
