//! L2 content-addressed disk cache.
//!
//! One file per key (`<md5>.vec`), containing the vector as little-endian
//! f32 bytes. Embeddings survive process restarts. Writes are best-effort:
//! a failing disk write is logged, not fatal.

use std::path::{Path, PathBuf};

use tracing::warn;

use engram_core::errors::{EmbeddingError, EngramError, EngramResult};

/// L2 persistent embedding cache backed by a directory of vector files.
pub struct L2DiskCache {
    dir: PathBuf,
}

impl L2DiskCache {
    /// Open the cache, creating its directory if needed.
    pub fn open(dir: &Path) -> EngramResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            EngramError::Embedding(EmbeddingError::DiskCache {
                message: format!("create {}: {e}", dir.display()),
            })
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, content_hash: &str) -> PathBuf {
        self.dir.join(format!("{content_hash}.vec"))
    }

    /// Look up an embedding by content hash.
    pub fn get(&self, content_hash: &str) -> Option<Vec<f32>> {
        let bytes = std::fs::read(self.path_for(content_hash)).ok()?;
        if bytes.len() % 4 != 0 {
            warn!(key = content_hash, "corrupt cache file, ignoring");
            return None;
        }
        Some(bytes_to_f32(&bytes))
    }

    /// Store an embedding keyed by content hash. Best-effort.
    pub fn insert(&self, content_hash: &str, embedding: &[f32]) {
        let path = self.path_for(content_hash);
        if let Err(e) = std::fs::write(&path, f32_to_bytes(embedding)) {
            warn!(key = content_hash, error = %e, "L2 cache write failed");
        }
    }

    /// Whether a content hash exists in the cache.
    pub fn contains(&self, content_hash: &str) -> bool {
        self.path_for(content_hash).exists()
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "vec"))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn f32_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = L2DiskCache::open(dir.path()).unwrap();
        let embedding = vec![1.0f32, 2.5, -3.7, 0.0];

        cache.insert("deadbeef", &embedding);
        assert_eq!(cache.get("deadbeef"), Some(embedding));
        assert!(cache.contains("deadbeef"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = L2DiskCache::open(dir.path()).unwrap();
        assert!(cache.get("missing").is_none());
        assert!(!cache.contains("missing"));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = L2DiskCache::open(dir.path()).unwrap();
            cache.insert("persist", &[4.0, 5.0]);
        }
        let cache = L2DiskCache::open(dir.path()).unwrap();
        assert_eq!(cache.get("persist"), Some(vec![4.0, 5.0]), "embedding should survive reopen");
    }

    #[test]
    fn corrupt_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = L2DiskCache::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("bad.vec"), [1u8, 2, 3]).unwrap();
        assert!(cache.get("bad").is_none());
    }
}
