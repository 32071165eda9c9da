use serde::{Deserialize, Serialize};

/// Recovery-worker tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Seconds between sweeps. The first sweep runs immediately.
    pub sweep_interval_secs: u64,
    /// A PENDING node untouched for this long is considered abandoned.
    pub stale_after_secs: i64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
            stale_after_secs: 600,
        }
    }
}
