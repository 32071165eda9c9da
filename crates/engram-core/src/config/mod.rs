pub mod breaker_config;
pub mod embedding_config;
pub mod extraction_config;
pub mod rate_limit_config;
pub mod recovery_config;
pub mod storage_config;
pub mod vector_config;

use serde::{Deserialize, Serialize};

pub use breaker_config::BreakerConfig;
pub use embedding_config::EmbeddingConfig;
pub use extraction_config::ExtractionConfig;
pub use rate_limit_config::RateLimitConfig;
pub use recovery_config::RecoveryConfig;
pub use storage_config::StorageConfig;
pub use vector_config::VectorConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngramConfig {
    pub storage: StorageConfig,
    pub vector: VectorConfig,
    pub embedding: EmbeddingConfig,
    pub extraction: ExtractionConfig,
    pub breaker: BreakerConfig,
    pub recovery: RecoveryConfig,
    pub rate_limit: RateLimitConfig,
}

impl EngramConfig {
    /// Parse config from a TOML string, falling back to defaults for
    /// missing fields. Locating and reading the file is the host's job.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = EngramConfig::from_toml("").unwrap();
        assert_eq!(cfg.breaker.failure_threshold, 3);
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.recovery.sweep_interval_secs, 300);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = EngramConfig::from_toml(
            r#"
            [breaker]
            failure_threshold = 7

            [embedding]
            provider = "remote"
            dimensions = 1536
            "#,
        )
        .unwrap();
        assert_eq!(cfg.breaker.failure_threshold, 7);
        assert_eq!(cfg.breaker.reset_timeout_ms, 30_000);
        assert_eq!(cfg.embedding.provider, "remote");
        assert_eq!(cfg.embedding.dimensions, 1536);
    }
}
