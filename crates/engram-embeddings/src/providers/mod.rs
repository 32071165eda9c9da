//! Embedding providers.
//!
//! `local` and `remote` are both HTTP backends (a local model server at
//! 384 dims, a hosted API at 1536); `mock` generates CSPRNG vectors and is
//! only ever constructed when the config names it explicitly. There is no
//! silent fallback from a failed provider to the mock — failures surface
//! so the circuit breaker can count them.

pub mod http;
pub mod mock;

use engram_core::config::EmbeddingConfig;
use engram_core::errors::{EmbeddingError, EngramError, EngramResult};
use engram_core::traits::IEmbeddingProvider;

pub use http::HttpProvider;
pub use mock::MockProvider;

/// Build the provider named by the config.
pub fn create_provider(config: &EmbeddingConfig) -> EngramResult<Box<dyn IEmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(HttpProvider::new(
            "local",
            &config.endpoint,
            None,
            config.dimensions,
        ))),
        "remote" => Ok(Box::new(HttpProvider::new(
            "remote",
            &config.endpoint,
            config.api_key.clone(),
            config.dimensions,
        ))),
        "mock" => Ok(Box::new(MockProvider::new(config.dimensions))),
        other => Err(EngramError::Embedding(EmbeddingError::UnknownProvider {
            name: other.to_string(),
        })),
    }
}
