//! Entity and relationship extraction over the LLM client.
//!
//! Malformed model output degrades to an empty extraction; transport
//! failures propagate so the circuit breaker can count them.

use async_trait::async_trait;
use tracing::debug;

use engram_core::errors::EngramResult;
use engram_core::models::Extraction;
use engram_core::traits::IEntityExtractor;

use crate::client::LlmClient;
use crate::sanitize::sanitize_output;

const SYSTEM_PROMPT: &str = "You extract a knowledge graph from text. Respond with exactly one \
JSON document of the shape {\"entities\": [{\"name\", \"type\", \"metadata\"}], \
\"relationships\": [{\"from\", \"to\", \"type\"}]}. Entity names are short identifiers. \
Relationship types are single verbs.";

/// LLM-backed implementation of `IEntityExtractor`.
pub struct LlmEntityExtractor {
    client: LlmClient,
}

impl LlmEntityExtractor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Parse a sanitized model response, tolerating malformed documents.
    pub(crate) fn parse_response(raw: &str) -> Extraction {
        let cleaned = sanitize_output(raw);
        match serde_json::from_str::<Extraction>(&cleaned) {
            Ok(extraction) => extraction,
            Err(e) => {
                debug!(error = %e, "unparsable extraction output, degrading to empty");
                Extraction::default()
            }
        }
    }
}

#[async_trait]
impl IEntityExtractor for LlmEntityExtractor {
    async fn extract(&self, text: &str) -> EngramResult<Extraction> {
        let raw = self.client.complete(SYSTEM_PROMPT, text).await?;
        Ok(Self::parse_response(&raw))
    }
}
