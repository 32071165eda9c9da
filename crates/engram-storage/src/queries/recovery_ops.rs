//! Queries backing the recovery worker's sweep over abandoned PENDING nodes.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_core::models::{GraphNode, NodeStatus};

use super::node_ops::{row_to_node, NODE_COLUMNS};
use crate::to_storage_err;

/// All PENDING nodes whose `updated_at` is older than `cutoff` (epoch
/// seconds), across every tenant.
pub fn find_stale_pending(conn: &Connection, cutoff: i64) -> EngramResult<Vec<GraphNode>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes
             WHERE status = 'PENDING' AND updated_at < ?1
             ORDER BY updated_at"
        ))
        .map_err(|e| to_storage_err("find_stale_pending", e))?;

    let rows = stmt
        .query_map(params![cutoff], row_to_node)
        .map_err(|e| to_storage_err("find_stale_pending", e))?;

    let mut nodes = Vec::new();
    for row in rows {
        nodes.push(row.map_err(|e| to_storage_err("find_stale_pending", e))?);
    }
    Ok(nodes)
}

/// Transition an abandoned node to FAILED, touching `updated_at` and
/// annotating `metadata.recovery_note` for manual replay.
pub fn mark_failed(conn: &Connection, node: &GraphNode, note: &str) -> EngramResult<()> {
    let mut metadata = node.metadata.clone();
    if !metadata.is_object() {
        metadata = serde_json::json!({});
    }
    metadata["recovery_note"] = serde_json::Value::String(note.to_string());

    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "UPDATE nodes SET status = ?1, metadata = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            NodeStatus::Failed.as_str(),
            serde_json::to_string(&metadata)?,
            now,
            node.id,
        ],
    )
    .map_err(|e| to_storage_err("mark_failed", e))?;
    Ok(())
}
