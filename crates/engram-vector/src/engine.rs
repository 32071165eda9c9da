//! VectorStore — a dedicated SQLite file holding embedding blobs.
//!
//! Vectors are stored as little-endian f32 bytes. Search is brute-force
//! cosine over the tenant's records; fine for a local single-host store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use engram_core::errors::{EngramError, EngramResult, VectorError};
use engram_core::models::VectorRecord;

use crate::similarity::cosine;
use crate::to_vector_err;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS vectors (
        id TEXT PRIMARY KEY,
        embedding BLOB NOT NULL,
        dims INTEGER NOT NULL,
        text TEXT NOT NULL,
        tenant TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        node_name TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}'
    );
    CREATE INDEX IF NOT EXISTS idx_vectors_tenant ON vectors (tenant, timestamp);
";

/// The vector store engine.
pub struct VectorStore {
    conn: Mutex<Connection>,
}

impl VectorStore {
    /// Open (creating if needed) the store inside the given directory.
    pub fn open(dir: &Path) -> EngramResult<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| to_vector_err("open", format!("create {}: {e}", dir.display())))?;
        let conn = Connection::open(dir.join("vectors.db"))
            .map_err(|e| to_vector_err("open", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| to_vector_err("open", e))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| to_vector_err("open", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> EngramResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_vector_err("open", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| to_vector_err("open", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, operation: &str, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_vector_err(operation, format!("lock poisoned: {e}")))?;
        f(&guard)
    }

    /// Insert or replace a record by id.
    pub fn upsert(&self, record: &VectorRecord) -> EngramResult<()> {
        let bytes = f32_to_bytes(&record.vector);
        self.with_conn("upsert", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO vectors
                     (id, embedding, dims, text, tenant, timestamp, node_name, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    bytes,
                    record.vector.len() as i64,
                    record.text,
                    record.tenant,
                    record.timestamp,
                    record.node_name,
                    record.metadata,
                ],
            )
            .map_err(|e| to_vector_err("upsert", e))?;
            Ok(())
        })
    }

    /// Fetch one record by id.
    pub fn get(&self, id: &str) -> EngramResult<Option<VectorRecord>> {
        self.with_conn("get", |conn| {
            conn.query_row(
                "SELECT id, embedding, text, tenant, timestamp, node_name, metadata
                 FROM vectors WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(|e| to_vector_err("get", e))
        })
    }

    /// k-nearest-neighbor search by cosine similarity, filtered to one
    /// tenant (and optionally a closed timestamp range). Only records of
    /// the query's dimension participate.
    pub fn search(
        &self,
        query: &[f32],
        tenant: &str,
        k: usize,
        time_range: Option<(i64, i64)>,
    ) -> EngramResult<Vec<(VectorRecord, f64)>> {
        if query.is_empty() {
            return Err(EngramError::VectorStore(VectorError::DimensionMismatch {
                expected: 1,
                actual: 0,
            }));
        }

        let (from, to) = time_range.unwrap_or((i64::MIN, i64::MAX));
        let mut scored = self.with_conn("search", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, embedding, text, tenant, timestamp, node_name, metadata
                     FROM vectors
                     WHERE tenant = ?1 AND dims = ?2 AND timestamp BETWEEN ?3 AND ?4",
                )
                .map_err(|e| to_vector_err("search", e))?;

            let rows = stmt
                .query_map(params![tenant, query.len() as i64, from, to], row_to_record)
                .map_err(|e| to_vector_err("search", e))?;

            let mut scored: Vec<(VectorRecord, f64)> = Vec::new();
            for row in rows {
                let record = row.map_err(|e| to_vector_err("search", e))?;
                let score = cosine(query, &record.vector);
                scored.push((record, score));
            }
            Ok(scored)
        })?;

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        debug!(tenant, k, hits = scored.len(), "vector search");
        Ok(scored)
    }

    /// Delete a set of records by id. Returns how many rows went away.
    pub fn delete_ids(&self, ids: &[String]) -> EngramResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn("delete_ids", |conn| {
            let placeholders = vec!["?"; ids.len()].join(",");
            let sql = format!("DELETE FROM vectors WHERE id IN ({placeholders})");
            let mut stmt = conn.prepare(&sql).map_err(|e| to_vector_err("delete_ids", e))?;
            stmt.execute(rusqlite::params_from_iter(ids.iter()))
                .map_err(|e| to_vector_err("delete_ids", e))
        })
    }

    /// Number of records belonging to a tenant.
    pub fn count(&self, tenant: &str) -> EngramResult<usize> {
        self.with_conn("count", |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM vectors WHERE tenant = ?1",
                    params![tenant],
                    |row| row.get(0),
                )
                .map_err(|e| to_vector_err("count", e))?;
            Ok(count as usize)
        })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<VectorRecord> {
    let bytes: Vec<u8> = row.get(1)?;
    Ok(VectorRecord {
        id: row.get(0)?,
        vector: bytes_to_f32(&bytes),
        text: row.get(2)?,
        tenant: row.get(3)?,
        timestamp: row.get(4)?,
        node_name: row.get(5)?,
        metadata: row.get(6)?,
    })
}

fn f32_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
