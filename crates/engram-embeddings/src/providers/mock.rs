//! Mock provider for tests: vectors from a cryptographically secure RNG.
//!
//! Only constructed when the config says `provider = "mock"`. Production
//! embed paths must surface their errors instead of falling back here.

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::Rng;

use engram_core::errors::EngramResult;
use engram_core::traits::IEmbeddingProvider;

pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl IEmbeddingProvider for MockProvider {
    async fn embed(&self, _text: &str) -> EngramResult<Vec<f32>> {
        let mut rng = OsRng;
        Ok((0..self.dimensions).map(|_| rng.gen_range(-1.0..1.0)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_vectors_of_the_target_dimension() {
        let provider = MockProvider::new(16);
        let vector = provider.embed("anything").await.unwrap();
        assert_eq!(vector.len(), 16);
        assert!(vector.iter().all(|v| (-1.0..1.0).contains(v)));
    }
}
