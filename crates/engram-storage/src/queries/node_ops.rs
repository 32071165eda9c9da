//! Insert, lookup, status transitions, and tenant purge for nodes.

use rusqlite::{params, Connection, OptionalExtension};

use engram_core::errors::{EngramError, EngramResult, StorageError};
use engram_core::models::{GraphNode, NodeStatus};

use crate::to_storage_err;

/// Column list shared by every node SELECT.
pub const NODE_COLUMNS: &str =
    "id, name, node_type, content, tenant, embedding_id, metadata, status, created_at, updated_at";

/// Map a SELECT row (in `NODE_COLUMNS` order) to a `GraphNode`.
pub fn row_to_node(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphNode> {
    let metadata: String = row.get(6)?;
    let status: String = row.get(7)?;
    Ok(GraphNode {
        id: row.get(0)?,
        name: row.get(1)?,
        node_type: row.get(2)?,
        content: row.get(3)?,
        tenant: row.get(4)?,
        embedding_id: row.get(5)?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        status: NodeStatus::parse(&status).unwrap_or(NodeStatus::Failed),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Insert a node, returning its store-assigned id.
///
/// A `(name, tenant)` collision surfaces as `StorageError::UniqueViolation`
/// so callers can distinguish the race from other failures.
#[allow(clippy::too_many_arguments)]
pub fn insert_node(
    conn: &Connection,
    name: &str,
    node_type: &str,
    content: Option<&str>,
    tenant: &str,
    embedding_id: Option<&str>,
    metadata: &serde_json::Value,
    status: NodeStatus,
) -> EngramResult<i64> {
    let now = chrono::Utc::now().timestamp();
    let metadata_json = serde_json::to_string(metadata)?;
    conn.execute(
        "INSERT INTO nodes (name, node_type, content, tenant, embedding_id, metadata, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            name,
            node_type,
            content,
            tenant,
            embedding_id,
            metadata_json,
            status.as_str(),
            now,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            EngramError::Database(StorageError::UniqueViolation {
                name: name.to_string(),
                tenant: tenant.to_string(),
            })
        } else {
            to_storage_err("insert_node", e)
        }
    })?;
    Ok(conn.last_insert_rowid())
}

/// Look up a node by `(name, tenant)`.
pub fn get_node(conn: &Connection, name: &str, tenant: &str) -> EngramResult<Option<GraphNode>> {
    conn.query_row(
        &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE name = ?1 AND tenant = ?2"),
        params![name, tenant],
        row_to_node,
    )
    .optional()
    .map_err(|e| to_storage_err("get_node", e))
}

/// Look up a node by its vector-store handle, scoped to the tenant.
pub fn get_node_by_embedding(
    conn: &Connection,
    embedding_id: &str,
    tenant: &str,
) -> EngramResult<Option<GraphNode>> {
    conn.query_row(
        &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE embedding_id = ?1 AND tenant = ?2"),
        params![embedding_id, tenant],
        row_to_node,
    )
    .optional()
    .map_err(|e| to_storage_err("get_node_by_embedding", e))
}

/// Get a node by name or create it as a READY entity node.
///
/// Concurrent creators of the same `(name, tenant)` race on the unique
/// index; the loser sees the constraint violation, treats it as "another
/// task won", and retries with a read.
pub fn get_or_create_node(
    conn: &Connection,
    name: &str,
    node_type: &str,
    tenant: &str,
) -> EngramResult<GraphNode> {
    if let Some(existing) = get_node(conn, name, tenant)? {
        return Ok(existing);
    }

    match insert_node(
        conn,
        name,
        node_type,
        None,
        tenant,
        None,
        &serde_json::json!({}),
        NodeStatus::Ready,
    ) {
        Ok(_) => {}
        Err(EngramError::Database(StorageError::UniqueViolation { .. })) => {}
        Err(e) => return Err(e),
    }

    get_node(conn, name, tenant)?.ok_or_else(|| {
        to_storage_err(
            "get_or_create_node",
            format!("node {name} vanished after unique-race retry"),
        )
    })
}

/// Transition a node's status, touching `updated_at`.
pub fn set_status(conn: &Connection, id: i64, status: NodeStatus) -> EngramResult<()> {
    let now = chrono::Utc::now().timestamp();
    let changed = conn
        .execute(
            "UPDATE nodes SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, id],
        )
        .map_err(|e| to_storage_err("set_status", e))?;
    if changed == 0 {
        return Err(EngramError::NotFound {
            entity: "node".to_string(),
            key: id.to_string(),
        });
    }
    Ok(())
}

/// Delete every node (and, by cascade, every edge) belonging to a tenant.
/// Returns the number of nodes removed.
pub fn purge_tenant(conn: &Connection, tenant: &str) -> EngramResult<usize> {
    conn.execute("DELETE FROM nodes WHERE tenant = ?1", params![tenant])
        .map_err(|e| to_storage_err("purge_tenant", e))
}
