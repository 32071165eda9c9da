//! Per-tenant fixed-window rate limiter.

use std::time::Instant;

use dashmap::DashMap;

use engram_core::config::RateLimitConfig;
use engram_core::errors::{EngramError, EngramResult};

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window counter per tenant. The window resets lazily on the first
/// call after it expires.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Admit or reject one call for `tenant`.
    pub fn check(&self, tenant: &str) -> EngramResult<()> {
        let mut entry = self
            .windows
            .entry(tenant.to_string())
            .or_insert_with(|| Window {
                started_at: Instant::now(),
                count: 0,
            });

        if entry.started_at.elapsed().as_millis() as u64 >= self.config.window_ms {
            entry.started_at = Instant::now();
            entry.count = 0;
        }

        if entry.count >= self.config.max_requests {
            return Err(EngramError::RateLimited {
                tenant: tenant.to_string(),
                limit: self.config.max_requests,
                window_ms: self.config.window_ms,
            });
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: max,
            window_ms,
        })
    }

    #[test]
    fn the_max_plus_first_call_in_a_window_fails() {
        let limiter = limiter(3, 60_000);
        for _ in 0..3 {
            limiter.check("u1").unwrap();
        }
        let err = limiter.check("u1").unwrap_err();
        assert!(matches!(err, EngramError::RateLimited { .. }));
        assert_eq!(err.code(), "ERR_RATE_LIMITED");
    }

    #[test]
    fn tenants_have_independent_windows() {
        let limiter = limiter(1, 60_000);
        limiter.check("u1").unwrap();
        limiter.check("u2").unwrap();
        assert!(limiter.check("u1").is_err());
        assert!(limiter.check("u2").is_err());
    }

    #[test]
    fn the_window_resets_after_it_expires() {
        let limiter = limiter(1, 30);
        limiter.check("u1").unwrap();
        assert!(limiter.check("u1").is_err());
        std::thread::sleep(std::time::Duration::from_millis(40));
        limiter.check("u1").unwrap();
    }
}
