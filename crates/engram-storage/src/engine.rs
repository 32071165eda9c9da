//! GraphStore — owns the connection pool, runs migrations on startup, and
//! exposes the node/edge/event/recovery operations to the rest of the
//! system.

use std::path::Path;

use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_core::models::{GraphEdge, GraphNode, MemoryEvent, NodeStatus};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{edge_ops, event_ops, node_ops, recovery_ops};

/// The relational graph store.
pub struct GraphStore {
    pool: ConnectionPool,
    /// When true, use the read pool for read operations (file-backed mode).
    /// When false, route all reads through the writer (in-memory mode,
    /// because in-memory read pool connections are isolated databases).
    use_read_pool: bool,
}

impl GraphStore {
    /// Open a graph store backed by a file on disk.
    pub fn open(path: &Path, read_pool_size: usize) -> EngramResult<Self> {
        let pool = ConnectionPool::open(path, read_pool_size)?;
        let store = Self {
            pool,
            use_read_pool: true,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory graph store (for testing).
    pub fn open_in_memory() -> EngramResult<Self> {
        let pool = ConnectionPool::open_in_memory(1)?;
        let store = Self {
            pool,
            use_read_pool: false,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> EngramResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| migrations::run_migrations(conn))
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a closure with the write connection.
    pub fn with_writer<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        self.pool.writer.with_conn_sync(f)
    }

    /// Execute a read-only query on the best available connection.
    /// File-backed: uses the read pool (no writer contention).
    /// In-memory: uses the writer (read pool is isolated).
    pub fn with_reader<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }

    // --- node operations ---

    #[allow(clippy::too_many_arguments)]
    pub fn insert_node(
        &self,
        name: &str,
        node_type: &str,
        content: Option<&str>,
        tenant: &str,
        embedding_id: Option<&str>,
        metadata: &serde_json::Value,
        status: NodeStatus,
    ) -> EngramResult<i64> {
        self.with_writer(|conn| {
            node_ops::insert_node(conn, name, node_type, content, tenant, embedding_id, metadata, status)
        })
    }

    pub fn get_node(&self, name: &str, tenant: &str) -> EngramResult<Option<GraphNode>> {
        self.with_reader(|conn| node_ops::get_node(conn, name, tenant))
    }

    pub fn get_node_by_embedding(
        &self,
        embedding_id: &str,
        tenant: &str,
    ) -> EngramResult<Option<GraphNode>> {
        self.with_reader(|conn| node_ops::get_node_by_embedding(conn, embedding_id, tenant))
    }

    pub fn get_or_create_node(
        &self,
        name: &str,
        node_type: &str,
        tenant: &str,
    ) -> EngramResult<GraphNode> {
        self.with_writer(|conn| node_ops::get_or_create_node(conn, name, node_type, tenant))
    }

    pub fn set_status(&self, id: i64, status: NodeStatus) -> EngramResult<()> {
        self.with_writer(|conn| node_ops::set_status(conn, id, status))
    }

    pub fn purge_tenant(&self, tenant: &str) -> EngramResult<usize> {
        self.with_writer(|conn| node_ops::purge_tenant(conn, tenant))
    }

    // --- edge operations ---

    pub fn insert_edge(
        &self,
        source_id: i64,
        target_id: i64,
        edge_type: &str,
        weight: f64,
        tenant: &str,
        metadata: &serde_json::Value,
    ) -> EngramResult<i64> {
        self.with_writer(|conn| {
            edge_ops::insert_edge(conn, source_id, target_id, edge_type, weight, tenant, metadata)
        })
    }

    pub fn edges_among(&self, tenant: &str, node_ids: &[i64]) -> EngramResult<Vec<GraphEdge>> {
        self.with_reader(|conn| edge_ops::edges_among(conn, tenant, node_ids))
    }

    // --- audit events ---

    pub fn append_event(
        &self,
        event_type: &str,
        description: &str,
        metadata: &serde_json::Value,
        tenant: &str,
    ) -> EngramResult<i64> {
        self.with_writer(|conn| event_ops::append_event(conn, event_type, description, metadata, tenant))
    }

    pub fn recent_events(&self, tenant: &str, limit: i64) -> EngramResult<Vec<MemoryEvent>> {
        self.with_reader(|conn| event_ops::list_recent(conn, tenant, limit))
    }

    // --- recovery ---

    pub fn find_stale_pending(&self, cutoff: i64) -> EngramResult<Vec<GraphNode>> {
        self.with_reader(|conn| recovery_ops::find_stale_pending(conn, cutoff))
    }

    pub fn mark_failed(&self, node: &GraphNode, note: &str) -> EngramResult<()> {
        self.with_writer(|conn| recovery_ops::mark_failed(conn, node, note))
    }
}
