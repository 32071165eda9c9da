//! v001: nodes and edges.
//!
//! `(name, tenant)` is the identity of a node; edges cascade with their
//! endpoints and can never be self-loops.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn apply(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            node_type TEXT NOT NULL DEFAULT 'concept',
            content TEXT,
            tenant TEXT NOT NULL,
            embedding_id TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            status TEXT NOT NULL DEFAULT 'PENDING'
                CHECK (status IN ('PENDING', 'READY', 'FAILED')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (name, tenant)
        );

        CREATE INDEX idx_nodes_tenant ON nodes (tenant);
        CREATE INDEX idx_nodes_embedding ON nodes (tenant, embedding_id);
        CREATE INDEX idx_nodes_status ON nodes (status, updated_at);

        CREATE TABLE edges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id INTEGER NOT NULL REFERENCES nodes (id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES nodes (id) ON DELETE CASCADE,
            edge_type TEXT NOT NULL DEFAULT 'related_to',
            weight REAL NOT NULL DEFAULT 1.0,
            tenant TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            CHECK (source_id <> target_id)
        );

        CREATE INDEX idx_edges_source ON edges (tenant, source_id);
        CREATE INDEX idx_edges_target ON edges (tenant, target_id);
        ",
    )
    .map_err(|e| to_storage_err("v001_graph_tables", e))?;
    Ok(())
}
