//! Non-recursive reads: keyword scan and paged graph dumps.

use rusqlite::{params, Connection};

use engram_core::constants::KEYWORD_SCAN_CAP;
use engram_core::errors::EngramResult;
use engram_core::models::{GraphFragment, GraphNode, GraphPage};
use engram_storage::queries::edge_ops;
use engram_storage::queries::node_ops::{row_to_node, NODE_COLUMNS};
use engram_storage::to_storage_err;

/// Substring match over `name`, `content`, and `node_type`, capped at 50
/// hits, returned with the edges connecting them. The query text is a
/// bound parameter; metacharacters cannot escape into the SQL.
pub fn search_nodes(conn: &Connection, query: &str, tenant: &str) -> EngramResult<GraphFragment> {
    let sql = format!(
        "SELECT {NODE_COLUMNS} FROM nodes
         WHERE tenant = ?1
           AND (name LIKE '%' || ?2 || '%'
                OR content LIKE '%' || ?2 || '%'
                OR node_type LIKE '%' || ?2 || '%')
         ORDER BY id
         LIMIT {KEYWORD_SCAN_CAP}"
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err("search_nodes", e))?;
    let rows = stmt
        .query_map(params![tenant, query], row_to_node)
        .map_err(|e| to_storage_err("search_nodes", e))?;

    let mut nodes: Vec<GraphNode> = Vec::new();
    for row in rows {
        nodes.push(row.map_err(|e| to_storage_err("search_nodes", e))?);
    }

    let ids: Vec<i64> = nodes.iter().map(|n| n.id).collect();
    let edges = edge_ops::edges_among(conn, tenant, &ids)?;
    Ok(GraphFragment { nodes, edges })
}

/// One page of a tenant's graph, ordered by node id, with edges restricted
/// to the page.
pub fn read_graph(
    conn: &Connection,
    tenant: &str,
    limit: i64,
    offset: i64,
) -> EngramResult<GraphPage> {
    let sql = format!(
        "SELECT {NODE_COLUMNS} FROM nodes WHERE tenant = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
    );

    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err("read_graph", e))?;
    let rows = stmt
        .query_map(params![tenant, limit, offset], row_to_node)
        .map_err(|e| to_storage_err("read_graph", e))?;

    let mut nodes: Vec<GraphNode> = Vec::new();
    for row in rows {
        nodes.push(row.map_err(|e| to_storage_err("read_graph", e))?);
    }

    let ids: Vec<i64> = nodes.iter().map(|n| n.id).collect();
    let edges = edge_ops::edges_among(conn, tenant, &ids)?;
    Ok(GraphPage {
        nodes,
        edges,
        limit,
        offset,
    })
}
