//! Session LRU: the most recent ingested content per tenant.

use std::time::Duration;

use moka::sync::Cache;

/// Process-wide session cache, keyed `recent:<tenant>`.
#[derive(Clone)]
pub struct SessionCache {
    cache: Cache<String, String>,
}

impl SessionCache {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1024)
            .time_to_live(Duration::from_secs(3600))
            .build();
        Self { cache }
    }

    /// Remember the last content a tenant ingested.
    pub fn remember(&self, tenant: &str, content: &str) {
        self.cache
            .insert(format!("recent:{tenant}"), content.to_string());
    }

    /// The tenant's most recent ingested content, if still cached.
    pub fn recent(&self, tenant: &str) -> Option<String> {
        self.cache.get(&format!("recent:{tenant}"))
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_the_latest_content_per_tenant() {
        let session = SessionCache::new();
        session.remember("u1", "first");
        session.remember("u1", "second");
        session.remember("u2", "other");

        assert_eq!(session.recent("u1").as_deref(), Some("second"));
        assert_eq!(session.recent("u2").as_deref(), Some("other"));
        assert_eq!(session.recent("u3"), None);
    }
}
