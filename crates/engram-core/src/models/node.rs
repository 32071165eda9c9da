use serde::{Deserialize, Serialize};

/// Lifecycle status of a graph node.
///
/// Memory anchors start `Pending` on the synchronous fast path and are
/// promoted to `Ready` when the background pipeline completes. The recovery
/// worker moves abandoned anchors to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Pending,
    Ready,
    Failed,
}

impl NodeStatus {
    /// Stable string form persisted in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Ready => "READY",
            Self::Failed => "FAILED",
        }
    }

    /// Parse the persisted string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "READY" => Some(Self::Ready),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A vertex in the knowledge graph: a memory anchor, an entity, or a concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Store-assigned monotone integer id.
    pub id: i64,
    /// Printable identifier, unique per tenant. Whitelist `[A-Za-z0-9_-]`.
    pub name: String,
    /// Free-form tag. Defaults to `concept`.
    pub node_type: String,
    /// Optional text payload (the ingested memory for anchors).
    pub content: Option<String>,
    /// Owning tenant. Every read and write is scoped to it.
    pub tenant: String,
    /// Opaque handle into the vector store. A forward reference while the
    /// node is `Pending`; guaranteed live once `Ready`.
    pub embedding_id: Option<String>,
    /// Opaque key→value mapping.
    pub metadata: serde_json::Value,
    pub status: NodeStatus,
    /// Epoch seconds.
    pub created_at: i64,
    /// Epoch seconds.
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_string_form() {
        for status in [NodeStatus::Pending, NodeStatus::Ready, NodeStatus::Failed] {
            assert_eq!(NodeStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(NodeStatus::parse("UNKNOWN"), None);
    }
}
