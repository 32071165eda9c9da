//! Recursive-CTE traversals over the knowledge graph.
//!
//! Cycle detection keeps the visited ids as a comma-framed string
//! (`,1,11,`): a candidate is admitted iff `,<id>,` is absent. The framing
//! matters — raw concatenation would falsely reject id 11 after visiting
//! id 1.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_core::models::{GraphFragment, GraphNode, PathResult};
use engram_storage::queries::edge_ops;
use engram_storage::queries::node_ops::{row_to_node, NODE_COLUMNS};
use engram_storage::to_storage_err;

/// Bounded breadth-first expansion over outgoing edges rooted at
/// `start_name`. Depth 0 is the anchor itself. Returns the deduplicated
/// node set plus every edge whose endpoints are both in the set.
pub fn subgraph(
    conn: &Connection,
    start_name: &str,
    tenant: &str,
    max_depth: i64,
) -> EngramResult<GraphFragment> {
    let ids = walk_ids(
        conn,
        "WITH RECURSIVE walk (id, depth, path) AS (
            SELECT n.id, 0, ',' || n.id || ','
            FROM nodes n
            WHERE n.name = ?1 AND n.tenant = ?2
            UNION ALL
            SELECT e.target_id,
                   w.depth + 1,
                   w.path || e.target_id || ','
            FROM edges e
            JOIN walk w ON e.source_id = w.id
            WHERE e.tenant = ?2
              AND w.depth < ?3
              AND instr(w.path, ',' || e.target_id || ',') = 0
        )
        SELECT DISTINCT id FROM walk",
        start_name,
        tenant,
        max_depth,
    )?;
    fragment_for(conn, tenant, &ids)
}

/// Bidirectional variant of [`subgraph`]: edges are followed regardless of
/// direction, for when inbound and outbound context both matter.
pub fn deep_context(
    conn: &Connection,
    start_name: &str,
    tenant: &str,
    max_depth: i64,
) -> EngramResult<GraphFragment> {
    let ids = walk_ids(
        conn,
        "WITH RECURSIVE walk (id, depth, path) AS (
            SELECT n.id, 0, ',' || n.id || ','
            FROM nodes n
            WHERE n.name = ?1 AND n.tenant = ?2
            UNION ALL
            SELECT CASE WHEN e.source_id = w.id THEN e.target_id ELSE e.source_id END,
                   w.depth + 1,
                   w.path || (CASE WHEN e.source_id = w.id THEN e.target_id ELSE e.source_id END) || ','
            FROM edges e
            JOIN walk w ON (e.source_id = w.id OR e.target_id = w.id)
            WHERE e.tenant = ?2
              AND w.depth < ?3
              AND instr(
                    w.path,
                    ',' || (CASE WHEN e.source_id = w.id THEN e.target_id ELSE e.source_id END) || ','
                  ) = 0
        )
        SELECT DISTINCT id FROM walk",
        start_name,
        tenant,
        max_depth,
    )?;
    fragment_for(conn, tenant, &ids)
}

/// Shortest path from `start` to `end` over outgoing edges, rendered as
/// `start -> a -> end`. Returns the shallowest match, or `None`.
///
/// Known limitation: the visited check is a substring test on the name
/// path, so a candidate whose name is a substring of an already-visited
/// name is skipped too. Acceptable for the short paths this runs on.
pub fn find_path(
    conn: &Connection,
    start: &str,
    end: &str,
    tenant: &str,
    max_depth: i64,
) -> EngramResult<Option<PathResult>> {
    let mut stmt = conn
        .prepare(
            "WITH RECURSIVE walk (id, name, depth, path) AS (
                SELECT n.id, n.name, 0, n.name
                FROM nodes n
                WHERE n.name = ?1 AND n.tenant = ?2
                UNION ALL
                SELECT t.id, t.name, w.depth + 1, w.path || ' -> ' || t.name
                FROM edges e
                JOIN walk w ON e.source_id = w.id
                JOIN nodes t ON t.id = e.target_id
                WHERE e.tenant = ?2
                  AND w.depth < ?4
                  AND instr(w.path, t.name) = 0
            )
            SELECT path, depth FROM walk WHERE name = ?3
            ORDER BY depth LIMIT 1",
        )
        .map_err(|e| to_storage_err("find_path", e))?;

    let result = stmt
        .query_map(params![start, tenant, end, max_depth], |row| {
            Ok(PathResult {
                path: row.get(0)?,
                depth: row.get(1)?,
            })
        })
        .map_err(|e| to_storage_err("find_path", e))?
        .next()
        .transpose()
        .map_err(|e| to_storage_err("find_path", e))?;

    Ok(result)
}

/// Run a walk CTE and collect the distinct node ids it reaches.
fn walk_ids(
    conn: &Connection,
    sql: &str,
    start_name: &str,
    tenant: &str,
    max_depth: i64,
) -> EngramResult<Vec<i64>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err("walk", e))?;
    let rows = stmt
        .query_map(params![start_name, tenant, max_depth], |row| row.get::<_, i64>(0))
        .map_err(|e| to_storage_err("walk", e))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row.map_err(|e| to_storage_err("walk", e))?);
    }
    Ok(ids)
}

/// Hydrate a set of node ids into a fragment with its connecting edges.
pub(crate) fn fragment_for(
    conn: &Connection,
    tenant: &str,
    ids: &[i64],
) -> EngramResult<GraphFragment> {
    if ids.is_empty() {
        return Ok(GraphFragment::default());
    }

    // Ids are typed integers, safe to splice into the IN list.
    let id_list = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT {NODE_COLUMNS} FROM nodes WHERE tenant = ?1 AND id IN ({id_list}) ORDER BY id"
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err("fragment_nodes", e))?;
    let rows = stmt
        .query_map(params![tenant], row_to_node)
        .map_err(|e| to_storage_err("fragment_nodes", e))?;

    let mut nodes: Vec<GraphNode> = Vec::new();
    for row in rows {
        nodes.push(row.map_err(|e| to_storage_err("fragment_nodes", e))?);
    }

    let edges = edge_ops::edges_among(conn, tenant, ids)?;
    Ok(GraphFragment { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::models::NodeStatus;
    use engram_storage::migrations::run_migrations;
    use engram_storage::queries::{edge_ops, node_ops};

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

    fn edge(conn: &Connection, from: i64, to: i64, tenant: &str) {
        edge_ops::insert_edge(conn, from, to, "related_to", 1.0, tenant, &serde_json::json!({}))
            .unwrap();
    }

    fn names(fragment: &GraphFragment) -> Vec<&str> {
        fragment.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn depth_bounds_the_expansion() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        let c = node(&conn, "c", "u1");
        edge(&conn, a, b, "u1");
        edge(&conn, b, c, "u1");

        let zero = subgraph(&conn, "a", "u1", 0).unwrap();
        assert_eq!(names(&zero), vec!["a"]);

        let one = subgraph(&conn, "a", "u1", 1).unwrap();
        assert_eq!(names(&one), vec!["a", "b"]);

        let two = subgraph(&conn, "a", "u1", 2).unwrap();
        assert_eq!(names(&two), vec!["a", "b", "c"]);
        assert_eq!(two.edges.len(), 2);
    }

    #[test]
    fn cycles_terminate_without_duplicates() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        let c = node(&conn, "c", "u1");
        edge(&conn, a, b, "u1");
        edge(&conn, b, c, "u1");
        edge(&conn, c, a, "u1");

        let fragment = subgraph(&conn, "a", "u1", 10).unwrap();
        assert_eq!(fragment.nodes.len(), 3);

        let mut ids: Vec<i64> = fragment.nodes.iter().map(|n| n.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3, "no node id may appear twice");
    }

    /// Regression guard for the comma framing: id 11 must be admitted even
    /// when id 1 is already in the visited path (and vice versa — visiting
    /// 11 must not block 1).
    #[test]
    fn cycle_detection_distinguishes_id_11_from_id_1() {
        let conn = test_conn();
        // Occupy ids 1..=11.
        let first = node(&conn, "n01", "u1");
        assert_eq!(first, 1);
        for i in 2..=11 {
            node(&conn, &format!("n{i:02}"), "u1");
        }

        // 1 -> 11 -> 2: without the comma framing, substring matching
        // aliases ids — a visited "11" swallows candidate "1" and a
        // visited "1" can swallow "11" depending on neighbors.
        edge(&conn, 1, 11, "u1");
        edge(&conn, 11, 2, "u1");

        let fragment = subgraph(&conn, "n01", "u1", 3).unwrap();
        let got = names(&fragment);
        assert!(got.contains(&"n11"), "id 11 must not be shadowed by visited id 1");
        assert!(got.contains(&"n02"), "id 2 must not be shadowed by the 1,11 path");

        // Opposite direction: visiting 11 first must not shadow 1.
        let fragment = subgraph(&conn, "n11", "u1", 2).unwrap();
        assert!(names(&fragment).contains(&"n02"));
    }

    #[test]
    fn traversal_is_tenant_scoped() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        edge(&conn, a, b, "u1");
        node(&conn, "a", "u2");

        let fragment = subgraph(&conn, "a", "u2", 3).unwrap();
        assert_eq!(names(&fragment), vec!["a"]);
        assert!(fragment.edges.is_empty());

        let missing = subgraph(&conn, "ghost", "u1", 3).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn deep_context_follows_inbound_edges() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        let c = node(&conn, "c", "u1");
        edge(&conn, a, b, "u1");
        edge(&conn, c, b, "u1");

        // Outgoing-only from b sees nothing; bidirectional sees both.
        let outgoing = subgraph(&conn, "b", "u1", 2).unwrap();
        assert_eq!(names(&outgoing), vec!["b"]);

        let both = deep_context(&conn, "b", "u1", 2).unwrap();
        assert_eq!(both.nodes.len(), 3);
        assert_eq!(both.edges.len(), 2);
    }

    #[test]
    fn find_path_returns_the_shallowest_route() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        let c = node(&conn, "c", "u1");
        let d = node(&conn, "d", "u1");
        // Long route a -> b -> c -> d and shortcut a -> d.
        edge(&conn, a, b, "u1");
        edge(&conn, b, c, "u1");
        edge(&conn, c, d, "u1");
        edge(&conn, a, d, "u1");

        let found = find_path(&conn, "a", "d", "u1", 5).unwrap().unwrap();
        assert_eq!(found.path, "a -> d");
        assert_eq!(found.depth, 1);
    }

    #[test]
    fn find_path_same_start_and_end_is_depth_zero() {
        let conn = test_conn();
        node(&conn, "a", "u1");
        let found = find_path(&conn, "a", "a", "u1", 5).unwrap().unwrap();
        assert_eq!(found.path, "a");
        assert_eq!(found.depth, 0);
    }

    #[test]
    fn find_path_misses_return_none() {
        let conn = test_conn();
        let a = node(&conn, "a", "u1");
        let b = node(&conn, "b", "u1");
        edge(&conn, b, a, "u1");

        // Edge points the wrong way.
        assert!(find_path(&conn, "a", "b", "u1", 5).unwrap().is_none());
        // Depth bound too tight.
        let c = node(&conn, "c", "u1");
        edge(&conn, a, c, "u1");
        edge(&conn, c, b, "u1");
        assert!(find_path(&conn, "a", "b", "u1", 1).unwrap().is_none());
    }
}
