//! Edge creation and retrieval. Edges are immutable once created.

use rusqlite::{params, Connection};

use engram_core::errors::{EngramError, EngramResult};
use engram_core::models::GraphEdge;

use crate::to_storage_err;

/// Column list shared by every edge SELECT.
pub const EDGE_COLUMNS: &str =
    "id, source_id, target_id, edge_type, weight, tenant, metadata, created_at";

/// Map a SELECT row (in `EDGE_COLUMNS` order) to a `GraphEdge`.
pub fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<GraphEdge> {
    let metadata: String = row.get(6)?;
    Ok(GraphEdge {
        id: row.get(0)?,
        source_id: row.get(1)?,
        target_id: row.get(2)?,
        edge_type: row.get(3)?,
        weight: row.get(4)?,
        tenant: row.get(5)?,
        metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
        created_at: row.get(7)?,
    })
}

/// Insert a directed edge between two existing nodes of the same tenant.
///
/// Self-loops are rejected, the type is lowercased, and both endpoints must
/// already exist under the edge's tenant.
pub fn insert_edge(
    conn: &Connection,
    source_id: i64,
    target_id: i64,
    edge_type: &str,
    weight: f64,
    tenant: &str,
    metadata: &serde_json::Value,
) -> EngramResult<i64> {
    if source_id == target_id {
        return Err(EngramError::Validation {
            field: "edge".to_string(),
            reason: format!("self-loop on node {source_id} is not allowed"),
        });
    }

    let endpoints: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM nodes WHERE id IN (?1, ?2) AND tenant = ?3",
            params![source_id, target_id, tenant],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err("insert_edge", e))?;
    if endpoints != 2 {
        return Err(EngramError::NotFound {
            entity: "edge endpoint".to_string(),
            key: format!("{source_id}->{target_id} in tenant {tenant}"),
        });
    }

    let now = chrono::Utc::now().timestamp();
    let metadata_json = serde_json::to_string(metadata)?;
    conn.execute(
        "INSERT INTO edges (source_id, target_id, edge_type, weight, tenant, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            source_id,
            target_id,
            edge_type.to_lowercase(),
            weight,
            tenant,
            metadata_json,
            now,
        ],
    )
    .map_err(|e| to_storage_err("insert_edge", e))?;
    Ok(conn.last_insert_rowid())
}

/// All edges of a tenant whose endpoints are both in `node_ids`.
pub fn edges_among(conn: &Connection, tenant: &str, node_ids: &[i64]) -> EngramResult<Vec<GraphEdge>> {
    if node_ids.is_empty() {
        return Ok(Vec::new());
    }

    // Ids are typed integers, safe to splice into the IN list.
    let id_list = node_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT {EDGE_COLUMNS} FROM edges
         WHERE tenant = ?1 AND source_id IN ({id_list}) AND target_id IN ({id_list})
         ORDER BY id"
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err("edges_among", e))?;
    let rows = stmt
        .query_map(params![tenant], row_to_edge)
        .map_err(|e| to_storage_err("edges_among", e))?;

    let mut edges = Vec::new();
    for row in rows {
        edges.push(row.map_err(|e| to_storage_err("edges_among", e))?);
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::node_ops;
    use engram_core::models::NodeStatus;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn node(conn: &Connection, name: &str, tenant: &str) -> i64 {
        node_ops::insert_node(
            conn,
            name,
            "concept",
            None,
            tenant,
            None,
            &serde_json::json!({}),
            NodeStatus::Ready,
        )
        .unwrap()
    }

    #[test]
    fn insert_lowercases_type() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");

        insert_edge(&conn, a, b, "USES", 1.0, "u1", &serde_json::json!({})).unwrap();
        let edges = edges_among(&conn, "u1", &[a, b]).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, "uses");
    }

    #[test]
    fn self_loops_are_rejected() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let err = insert_edge(&conn, a, a, "related_to", 1.0, "u1", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, EngramError::Validation { .. }));
    }

    #[test]
    fn cross_tenant_endpoints_are_rejected() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u2");
        let err = insert_edge(&conn, a, b, "related_to", 1.0, "u1", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, EngramError::NotFound { .. }));
    }

    #[test]
    fn edges_among_requires_both_endpoints_in_set() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        let c = node(&conn, "c", "u1");
        insert_edge(&conn, a, b, "x", 1.0, "u1", &serde_json::json!({})).unwrap();
        insert_edge(&conn, b, c, "y", 1.0, "u1", &serde_json::json!({})).unwrap();

        let edges = edges_among(&conn, "u1", &[a, b]).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].edge_type, "x");
    }

    #[test]
    fn deleting_a_node_cascades_to_edges() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        insert_edge(&conn, a, b, "x", 1.0, "u1", &serde_json::json!({})).unwrap();

        conn.execute("DELETE FROM nodes WHERE id = ?1", params![a]).unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM edges", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
