//! Two-tier embedding cache.
//!
//! Read order: L1 (moka LRU) → L2 (one file per key) → compute. Writes go
//! through both tiers; an L2 disk failure is logged, never fatal. L2 hits
//! are promoted into L1.

pub mod l1_memory;
pub mod l2_disk;

use std::path::Path;

use engram_core::errors::EngramResult;

pub use l1_memory::L1MemoryCache;
pub use l2_disk::L2DiskCache;

/// Which tier served a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    L1,
    L2,
}

/// Cache key: lowercase hex MD5 of the input text.
pub fn cache_key(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

/// Coordinates the two tiers.
pub struct CacheCoordinator {
    l1: L1MemoryCache,
    l2: L2DiskCache,
}

impl CacheCoordinator {
    pub fn new(l1_entries: u64, l2_dir: &Path) -> EngramResult<Self> {
        Ok(Self {
            l1: L1MemoryCache::new(l1_entries),
            l2: L2DiskCache::open(l2_dir)?,
        })
    }

    /// Look up a key across both tiers, promoting L2 hits into L1.
    pub fn get(&self, key: &str) -> Option<(Vec<f32>, CacheTier)> {
        if let Some(vector) = self.l1.get(key) {
            return Some((vector, CacheTier::L1));
        }
        if let Some(vector) = self.l2.get(key) {
            self.l1.insert(key.to_string(), vector.clone());
            return Some((vector, CacheTier::L2));
        }
        None
    }

    /// Write a freshly computed vector through both tiers. Concurrent
    /// writers of the same key overwrite each other with equal values.
    pub fn put(&self, key: String, vector: &[f32]) {
        self.l1.insert(key.clone(), vector.to_vec());
        self.l2.insert(&key, vector);
    }
}
