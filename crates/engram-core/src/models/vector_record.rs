use serde::{Deserialize, Serialize};

/// A typed record in the vector store.
///
/// The graph and vector stores are independent backends; every
/// `embedding_id` on a `READY` node refers to a record with that id in the
/// same tenant — a runtime property enforced by the transaction manager,
/// not by either store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// UUID assigned at ingest; also the node's `embedding_id`.
    pub id: String,
    /// Fixed-dimension embedding (dimension fixed per provider).
    pub vector: Vec<f32>,
    /// The ingested text.
    pub text: String,
    pub tenant: String,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Back-reference to the anchor node, for audit.
    pub node_name: String,
    /// Serialized opaque metadata.
    pub metadata: String,
}
