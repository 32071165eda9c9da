/// Vector-store errors.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("vector store error in {operation}: {message}")]
    Store { operation: String, message: String },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector record not found: {id}")]
    RecordNotFound { id: String },
}
