//! Summary synthesis from retrieved graph fragments.

use async_trait::async_trait;

use engram_core::errors::EngramResult;
use engram_core::models::GraphFragment;
use engram_core::traits::ISummarizer;

use crate::client::LlmClient;
use crate::sanitize::sanitize_output;

const SYSTEM_PROMPT: &str = "You synthesize a short answer to a question from knowledge-graph \
fragments. Use only the provided facts. Answer in at most three sentences.";

/// LLM-backed implementation of `ISummarizer`.
pub struct LlmSummarizer {
    client: LlmClient,
}

impl LlmSummarizer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Render fragments into a compact fact list for the prompt.
    pub(crate) fn render_fragments(fragments: &[GraphFragment]) -> String {
        let mut lines = Vec::new();
        for fragment in fragments {
            for node in &fragment.nodes {
                match &node.content {
                    Some(content) => lines.push(format!("- {} ({}): {}", node.name, node.node_type, content)),
                    None => lines.push(format!("- {} ({})", node.name, node.node_type)),
                }
            }
            for edge in &fragment.edges {
                lines.push(format!("- edge {} -{}-> {}", edge.source_id, edge.edge_type, edge.target_id));
            }
        }
        lines.join("\n")
    }
}

#[async_trait]
impl ISummarizer for LlmSummarizer {
    async fn summarize(&self, query: &str, fragments: &[GraphFragment]) -> EngramResult<String> {
        let facts = Self::render_fragments(fragments);
        let user = format!("Question: {query}\n\nFacts:\n{facts}");
        let raw = self.client.complete(SYSTEM_PROMPT, &user).await?;
        Ok(sanitize_output(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::models::{GraphNode, NodeStatus};

    #[test]
    fn renders_nodes_and_edges_as_fact_lines() {
        let fragment = GraphFragment {
            nodes: vec![GraphNode {
                id: 1,
                name: "Alice".to_string(),
                node_type: "person".to_string(),
                content: Some("uses TypeScript".to_string()),
                tenant: "u1".to_string(),
                embedding_id: None,
                metadata: serde_json::Value::Null,
                status: NodeStatus::Ready,
                created_at: 0,
                updated_at: 0,
            }],
            edges: vec![],
        };
        let rendered = LlmSummarizer::render_fragments(&[fragment]);
        assert_eq!(rendered, "- Alice (person): uses TypeScript");
    }
}
