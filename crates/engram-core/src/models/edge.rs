use serde::{Deserialize, Serialize};

/// A directed relationship between two nodes of the same tenant.
///
/// Edges are immutable once created and removed only by cascade when an
/// endpoint node is deleted. Self-loops are rejected at insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    /// Lowercased verb. Defaults to `related_to`.
    pub edge_type: String,
    /// Relationship strength. Defaults to 1.0.
    pub weight: f64,
    pub tenant: String,
    pub metadata: serde_json::Value,
    /// Epoch seconds.
    pub created_at: i64,
}
