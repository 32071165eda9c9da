//! v002: append-only audit event log.

use rusqlite::Connection;

use engram_core::errors::EngramResult;

use crate::to_storage_err;

pub fn apply(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE memory_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_type TEXT NOT NULL,
            description TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            tenant TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX idx_events_tenant ON memory_events (tenant, created_at);
        ",
    )
    .map_err(|e| to_storage_err("v002_event_log", e))?;
    Ok(())
}
