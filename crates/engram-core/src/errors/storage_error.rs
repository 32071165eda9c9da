/// Storage-layer errors for SQLite operations on the graph database.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error in {operation}: {message}")]
    Sqlite { operation: String, message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("unique constraint violated on ({name}, {tenant})")]
    UniqueViolation { name: String, tenant: String },

    #[error("connection lock poisoned: {message}")]
    LockPoisoned { message: String },
}
