/// Embedding subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider {provider} failed: {message}")]
    ProviderFailed { provider: String, message: String },

    #[error("unknown embedding provider: {name}")]
    UnknownProvider { name: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("disk cache error: {message}")]
    DiskCache { message: String },
}
