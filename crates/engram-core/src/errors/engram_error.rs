use super::{EmbeddingError, ExtractionError, StorageError, VectorError};
use crate::redact::redact_secrets;

/// Top-level error type for the Engram memory engine.
/// All subsystem errors convert into this via `From` impls.
///
/// Every kind maps to a stable machine code, a retryability flag, and a
/// user-facing suggestion; `to_user_friendly` renders all three with
/// secrets redacted.
#[derive(Debug, thiserror::Error)]
pub enum EngramError {
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("database error: {0}")]
    Database(#[from] StorageError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("concurrency conflict in {operation}: {reason}")]
    Concurrency { operation: String, reason: String },

    #[error("circuit {breaker} is open, retry after {retry_after_ms}ms")]
    CircuitOpen { breaker: String, retry_after_ms: u64 },

    #[error("rate limit exceeded for tenant {tenant}: {limit} requests per {window_ms}ms")]
    RateLimited {
        tenant: String,
        limit: u32,
        window_ms: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl EngramError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ERR_VALIDATION",
            Self::NotFound { .. } => "ERR_NOT_FOUND",
            Self::Database(_) => "ERR_DATABASE",
            Self::VectorStore(_) | Self::Embedding(_) | Self::Extraction(_) => {
                "ERR_EXTERNAL_SERVICE"
            }
            Self::Concurrency { .. } => "ERR_CONCURRENCY",
            Self::CircuitOpen { .. } => "ERR_CIRCUIT_OPEN",
            Self::RateLimited { .. } => "ERR_RATE_LIMITED",
            Self::Serialization(_) => "ERR_SERIALIZATION",
            Self::Config(_) => "ERR_CONFIG",
        }
    }

    /// The subsystem the error originated in.
    pub fn component(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validator",
            Self::NotFound { .. } => "storage",
            Self::Database(_) => "graph-store",
            Self::VectorStore(_) => "vector-store",
            Self::Embedding(_) => "embeddings",
            Self::Extraction(_) => "extraction",
            Self::Concurrency { .. } => "transactions",
            Self::CircuitOpen { .. } => "circuit-breaker",
            Self::RateLimited { .. } => "rate-limiter",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
        }
    }

    /// Whether the caller can reasonably retry the operation.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Validation { .. }
            | Self::NotFound { .. }
            | Self::Serialization(_)
            | Self::Config(_) => false,
            Self::Database(_)
            | Self::VectorStore(_)
            | Self::Embedding(_)
            | Self::Extraction(_)
            | Self::Concurrency { .. }
            | Self::CircuitOpen { .. }
            | Self::RateLimited { .. } => true,
        }
    }

    /// Actionable guidance rendered alongside the error message.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Validation { .. } => {
                "check the input: names are 1-200 chars of [A-Za-z0-9_-], tenants are non-empty"
            }
            Self::NotFound { .. } => "verify the identifier and tenant, then retry the lookup",
            Self::Database(_) => "the graph store rejected the operation; retry if transient",
            Self::VectorStore(_) => "the vector store is unavailable; retry shortly",
            Self::Embedding(_) => "the embedding provider failed; check its endpoint and retry",
            Self::Extraction(_) => "the LLM collaborator failed; the memory is still searchable",
            Self::Concurrency { .. } => "another operation holds the transaction; back off and retry",
            Self::CircuitOpen { .. } => "the dependency is suppressed; wait for the reset window",
            Self::RateLimited { .. } => "slow down: the tenant exceeded its request window",
            Self::Serialization(_) => "the payload is not valid JSON for this operation",
            Self::Config(_) => "fix the configuration value and restart",
        }
    }

    /// Render `[CODE] message — suggestion` for the tool layer, with any
    /// embedded secrets redacted.
    pub fn to_user_friendly(&self) -> String {
        redact_secrets(&format!("[{}] {} — {}", self.code(), self, self.suggestion()))
    }
}

/// Convenience type alias.
pub type EngramResult<T> = Result<T, EngramError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = EngramError::Validation {
            field: "name".into(),
            reason: "empty".into(),
        };
        assert_eq!(err.code(), "ERR_VALIDATION");
        assert!(!err.retryable());

        let err = EngramError::CircuitOpen {
            breaker: "embedding".into(),
            retry_after_ms: 30_000,
        };
        assert_eq!(err.code(), "ERR_CIRCUIT_OPEN");
        assert!(err.retryable());
    }

    #[test]
    fn user_friendly_includes_code_and_suggestion() {
        let err = EngramError::NotFound {
            entity: "node".into(),
            key: "mem-deadbeef".into(),
        };
        let rendered = err.to_user_friendly();
        assert!(rendered.starts_with("[ERR_NOT_FOUND]"));
        assert!(rendered.contains("mem-deadbeef"));
        assert!(rendered.contains("—"));
    }

    #[test]
    fn user_friendly_redacts_secrets() {
        let err = EngramError::Embedding(EmbeddingError::ProviderFailed {
            provider: "remote".into(),
            message: "401 for key sk-abcdefghijklmnopqrstuvwxyz123456".into(),
        });
        let rendered = err.to_user_friendly();
        assert!(!rendered.contains("sk-abcdefghijklmnopqrstuvwxyz123456"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn subsystem_errors_fold_in() {
        let err: EngramError = StorageError::Sqlite {
            operation: "insert_node".into(),
            message: "disk full".into(),
        }
        .into();
        assert_eq!(err.code(), "ERR_DATABASE");
        assert_eq!(err.component(), "graph-store");
    }
}
