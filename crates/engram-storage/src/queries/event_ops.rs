//! Append-only audit event log.

use rusqlite::{params, Connection};

use engram_core::errors::EngramResult;
use engram_core::models::MemoryEvent;

use crate::to_storage_err;

/// Append an audit event. Events are never updated or deleted.
pub fn append_event(
    conn: &Connection,
    event_type: &str,
    description: &str,
    metadata: &serde_json::Value,
    tenant: &str,
) -> EngramResult<i64> {
    let now = chrono::Utc::now().timestamp();
    let metadata_json = serde_json::to_string(metadata)?;
    conn.execute(
        "INSERT INTO memory_events (event_type, description, metadata, tenant, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![event_type, description, metadata_json, tenant, now],
    )
    .map_err(|e| to_storage_err("append_event", e))?;
    Ok(conn.last_insert_rowid())
}

/// Most recent events for a tenant, newest first.
pub fn list_recent(conn: &Connection, tenant: &str, limit: i64) -> EngramResult<Vec<MemoryEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, event_type, description, metadata, tenant, created_at
             FROM memory_events WHERE tenant = ?1
             ORDER BY id DESC LIMIT ?2",
        )
        .map_err(|e| to_storage_err("list_recent", e))?;

    let rows = stmt
        .query_map(params![tenant, limit], |row| {
            let metadata: String = row.get(3)?;
            Ok(MemoryEvent {
                id: row.get(0)?,
                event_type: row.get(1)?,
                description: row.get(2)?,
                metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
                tenant: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .map_err(|e| to_storage_err("list_recent", e))?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row.map_err(|e| to_storage_err("list_recent", e))?);
    }
    Ok(events)
}
