//! The single write connection, serialized behind a mutex.
//!
//! SQLite allows one writer at a time; funnelling every mutation through
//! one connection keeps savepoint depth a process-local property.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use engram_core::errors::{EngramError, EngramResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The writer. All mutations and all transactional work go through here.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open the write connection for the given database file.
    pub fn open(path: &Path) -> EngramResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err("open_writer", e))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory write connection (for testing).
    pub fn open_in_memory() -> EngramResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| to_storage_err("open_writer_memory", e))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with the write connection.
    ///
    /// The lock is held only for the duration of the closure; callers must
    /// not await while inside.
    pub fn with_conn_sync<F, T>(&self, f: F) -> EngramResult<T>
    where
        F: FnOnce(&Connection) -> EngramResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| {
            EngramError::Database(StorageError::LockPoisoned {
                message: e.to_string(),
            })
        })?;
        f(&guard)
    }
}
