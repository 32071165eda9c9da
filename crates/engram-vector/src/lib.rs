//! # engram-vector
//!
//! The vector store: typed records with tenant-filtered k-NN search and
//! delete-by-id-set. Lives in its own directory with its own database
//! file — an independent backend from the graph store, by design.

pub mod engine;
pub mod similarity;

pub use engine::VectorStore;

use engram_core::errors::{EngramError, VectorError};

/// Map a low-level failure into the vector error taxonomy.
pub(crate) fn to_vector_err(operation: &str, message: impl std::fmt::Display) -> EngramError {
    EngramError::VectorStore(VectorError::Store {
        operation: operation.to_string(),
        message: message.to_string(),
    })
}
