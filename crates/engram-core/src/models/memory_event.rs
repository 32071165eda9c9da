use serde::{Deserialize, Serialize};

/// Append-only audit entry. Never updated, retained indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub id: i64,
    /// Event tag, e.g. `MEMORY_ADDED_FAST`, `MEMORY_PROCESSED`.
    pub event_type: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub tenant: String,
    /// Epoch seconds.
    pub created_at: i64,
}

/// Event tags emitted by the memory manager.
pub mod event_types {
    /// Fast-path insert completed; the caller has the node name.
    pub const MEMORY_ADDED_FAST: &str = "MEMORY_ADDED_FAST";
    /// Background pipeline promoted the anchor to READY.
    pub const MEMORY_PROCESSED: &str = "MEMORY_PROCESSED";
    /// Background pipeline failed; the anchor stays PENDING for recovery.
    pub const MEMORY_PROCESSING_FAILED: &str = "MEMORY_PROCESSING_FAILED";
}
