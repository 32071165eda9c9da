//! Versioned schema migrations for the graph database.
//!
//! Each migration runs once, inside its own transaction, tracked in the
//! `schema_migrations` table.

mod v001_graph_tables;
mod v002_event_log;

use rusqlite::Connection;
use tracing::info;

use engram_core::errors::{EngramError, EngramResult, StorageError};

use crate::to_storage_err;

/// A single schema migration.
struct Migration {
    version: u32,
    name: &'static str,
    apply: fn(&Connection) -> EngramResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "graph_tables",
        apply: v001_graph_tables::apply,
    },
    Migration {
        version: 2,
        name: "event_log",
        apply: v002_event_log::apply,
    },
];

/// Run all outstanding migrations on the given connection.
pub fn run_migrations(conn: &Connection) -> EngramResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )",
    )
    .map_err(|e| to_storage_err("run_migrations", e))?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err("run_migrations", e))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err("migration_begin", e))?;

        (migration.apply)(&tx).map_err(|e| {
            EngramError::Database(StorageError::MigrationFailed {
                version: migration.version,
                reason: e.to_string(),
            })
        })?;

        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp()
            ],
        )
        .map_err(|e| to_storage_err("migration_record", e))?;

        tx.commit().map_err(|e| {
            EngramError::Database(StorageError::MigrationFailed {
                version: migration.version,
                reason: e.to_string(),
            })
        })?;

        info!(version = migration.version, name = migration.name, "applied migration");
    }

    Ok(())
}
