//! # engram-storage
//!
//! Relational persistence for the knowledge graph: connection pool,
//! schema migrations, node/edge/event queries, and the transaction
//! manager (nested savepoints plus the cross-store compensation registry).

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod txn;

pub use engine::GraphStore;
pub use txn::{Saga, SagaState, SagaTransaction, TransactionManager};

use engram_core::errors::{EngramError, StorageError};

/// Map a low-level SQLite failure into the storage error taxonomy.
pub fn to_storage_err(operation: &str, message: impl std::fmt::Display) -> EngramError {
    EngramError::Database(StorageError::Sqlite {
        operation: operation.to_string(),
        message: message.to_string(),
    })
}
