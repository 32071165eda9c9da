use async_trait::async_trait;

use crate::errors::EngramResult;
use crate::models::Extraction;

/// Entity and relationship extraction over ingested text.
///
/// Implementations are expected to be tolerant: a malformed model response
/// is an `Ok(Extraction::default())`, not an error — the memory remains
/// usable without graph enrichment. Transport failures still surface as
/// errors so the circuit breaker can count them.
#[async_trait]
pub trait IEntityExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> EngramResult<Extraction>;
}
