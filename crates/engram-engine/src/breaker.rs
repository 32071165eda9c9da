//! Circuit breaker guarding fallible external calls.
//!
//! Three states. CLOSED counts consecutive failures and opens at the
//! threshold. OPEN rejects immediately until the reset timeout has elapsed
//! since the last failure, then admits a single probe (lazily — no timer).
//! A successful probe closes the circuit; a failed one re-opens it with a
//! refreshed timestamp.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use dashmap::DashMap;
use tracing::{error, info, warn};

use engram_core::config::BreakerConfig;
use engram_core::errors::{EngramError, EngramResult, StorageError};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: BreakerState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
}

/// A named circuit breaker around one external dependency.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: BreakerConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure_at: None,
            }),
        }
    }

    /// Run `action` through the breaker.
    ///
    /// Rejected calls fail with `CircuitOpen` without invoking the action.
    pub async fn call<T, F, Fut>(&self, action: F) -> EngramResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngramResult<T>>,
    {
        self.admit()?;

        // The action's outcome is authoritative; a poisoned-lock error
        // from the bookkeeping is logged, never allowed to mask it.
        match action().await {
            Ok(value) => {
                if let Err(le) = self.record_success() {
                    error!(breaker = %self.name, error = %le, "failed to record breaker success");
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(le) = self.record_failure() {
                    error!(breaker = %self.name, error = %le, "failed to record breaker failure");
                }
                Err(err)
            }
        }
    }

    /// Current state (for diagnostics and tests).
    pub fn state(&self) -> EngramResult<BreakerState> {
        Ok(self.lock_inner()?.state)
    }

    fn lock_inner(&self) -> EngramResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|e| {
            EngramError::Database(StorageError::LockPoisoned {
                message: e.to_string(),
            })
        })
    }

    fn admit(&self) -> EngramResult<()> {
        let mut inner = self.lock_inner()?;
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::Open => {
                let elapsed_ms = inner
                    .last_failure_at
                    .map(|t| t.elapsed().as_millis() as u64)
                    .unwrap_or(u64::MAX);
                if elapsed_ms >= self.config.reset_timeout_ms {
                    // This caller becomes the probe.
                    info!(breaker = %self.name, "reset window elapsed, probing");
                    inner.state = BreakerState::HalfOpen;
                    Ok(())
                } else {
                    Err(EngramError::CircuitOpen {
                        breaker: self.name.clone(),
                        retry_after_ms: self.config.reset_timeout_ms - elapsed_ms,
                    })
                }
            }
            // A probe is already in flight; only one passes through.
            BreakerState::HalfOpen => Err(EngramError::CircuitOpen {
                breaker: self.name.clone(),
                retry_after_ms: self.config.reset_timeout_ms,
            }),
        }
    }

    fn record_success(&self) -> EngramResult<()> {
        let mut inner = self.lock_inner()?;
        if inner.state == BreakerState::HalfOpen {
            info!(breaker = %self.name, "probe succeeded, closing circuit");
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        Ok(())
    }

    fn record_failure(&self) -> EngramResult<()> {
        let mut inner = self.lock_inner()?;
        inner.last_failure_at = Some(Instant::now());
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = inner.failure_count,
                        "failure threshold reached, opening circuit"
                    );
                    inner.state = BreakerState::Open;
                }
            }
            BreakerState::HalfOpen => {
                warn!(breaker = %self.name, "probe failed, re-opening circuit");
                inner.state = BreakerState::Open;
            }
            BreakerState::Open => {}
        }
        Ok(())
    }
}

/// Per-dependency breaker registry: one breaker per name, shared config.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Fetch (creating on first use) the breaker for a dependency.
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .clone()
    }
}
