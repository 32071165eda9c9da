//! EmbeddingEngine — the main entry point for engram-embeddings.
//!
//! Read-through over the two cache tiers, then the configured provider.
//! Identical texts always come back byte-equal: the first computation is
//! cached and every later call is served from a tier.

use tracing::{debug, info};

use engram_core::config::EmbeddingConfig;
use engram_core::errors::EngramResult;
use engram_core::traits::IEmbeddingProvider;

use crate::cache::{cache_key, CacheCoordinator};
use crate::providers;

/// The main embedding engine.
pub struct EmbeddingEngine {
    provider: Box<dyn IEmbeddingProvider>,
    cache: CacheCoordinator,
}

impl EmbeddingEngine {
    /// Create a new engine from configuration. Provider construction and
    /// cache setup happen once, here; `embed` itself holds no locks.
    pub fn new(config: &EmbeddingConfig) -> EngramResult<Self> {
        let provider = providers::create_provider(config)?;
        let cache = CacheCoordinator::new(config.l1_cache_entries, &config.cache_dir)?;

        info!(
            provider = provider.name(),
            dims = provider.dimensions(),
            "embedding engine initialized"
        );

        Ok(Self { provider, cache })
    }

    /// Embed a text, consulting L1 → L2 → provider.
    ///
    /// Concurrent misses on the same key may compute redundantly; the
    /// second writer overwrites with an equal value.
    pub async fn embed(&self, text: &str) -> EngramResult<Vec<f32>> {
        let key = cache_key(text);

        if let Some((vector, tier)) = self.cache.get(&key) {
            debug!(key = %key, tier = ?tier, "embedding cache hit");
            return Ok(vector);
        }

        let vector = self.provider.embed(text).await?;
        self.cache.put(key, &vector);
        Ok(vector)
    }

    /// Dimensionality of the configured provider.
    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Name of the configured provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::errors::{EmbeddingError, EngramError};

    fn mock_engine(dir: &std::path::Path) -> EmbeddingEngine {
        EmbeddingEngine::new(&EmbeddingConfig {
            provider: "mock".to_string(),
            dimensions: 8,
            cache_dir: dir.to_path_buf(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn embed_is_idempotent_per_text() {
        let dir = tempfile::tempdir().unwrap();
        let engine = mock_engine(dir.path());

        // The mock is random, so equality proves the cache is serving.
        let a = engine.embed("same text").await.unwrap();
        let b = engine.embed("same text").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn cached_vectors_survive_an_engine_restart() {
        let dir = tempfile::tempdir().unwrap();
        let first = {
            let engine = mock_engine(dir.path());
            engine.embed("durable").await.unwrap()
        };
        // A fresh engine has an empty L1 but shares the L2 directory.
        let engine = mock_engine(dir.path());
        let second = engine.embed("durable").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn distinct_texts_get_distinct_cache_entries() {
        let dir = tempfile::tempdir().unwrap();
        let engine = mock_engine(dir.path());
        let a = engine.embed("alpha").await.unwrap();
        let b = engine.embed("beta").await.unwrap();
        // Random vectors of dimension 8 are never equal in practice.
        assert_ne!(a, b);
    }

    #[test]
    fn misconfigured_provider_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddingEngine::new(&EmbeddingConfig {
            provider: "gpu".to_string(),
            cache_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(
            err,
            EngramError::Embedding(EmbeddingError::UnknownProvider { .. })
        ));
    }
}
