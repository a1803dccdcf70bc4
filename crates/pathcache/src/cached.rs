//! CachedStore: LRU cache in front of a FileStore

use std::path::Path;

use filestore::{FileStore, Resource};
use parking_lot::Mutex;
use tracing::trace;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::lru::Cache;
use crate::stats::StatsSnapshot;

/// File store with a shared LRU cache for hot resources
///
/// The cache engine is single-threaded; the mutex serializes every access
/// so a `CachedStore` can sit behind an `Arc` in a multi-threaded server.
pub struct CachedStore {
    /// Underlying file store
    store: FileStore,

    /// LRU cache for hot resources
    cache: Mutex<Cache>,

    /// Cache capacity
    capacity: usize,
}

impl CachedStore {
    /// Create a new CachedStore with the given capacity
    ///
    /// # Arguments
    /// * `root` - Directory to serve
    /// * `capacity` - Maximum number of cached resources
    ///
    /// # Returns
    /// * `Result<CachedStore>` - Cache-enabled store handle
    pub fn new<P: AsRef<Path>>(root: P, capacity: usize) -> Result<Self> {
        Self::with_config(root, CacheConfig::with_capacity(capacity))
    }

    /// Create a new CachedStore from a full cache config
    pub fn with_config<P: AsRef<Path>>(root: P, config: CacheConfig) -> Result<Self> {
        let cache: Cache = Cache::with_config(config)?;
        let store = FileStore::open(root)?;

        Ok(Self {
            store,
            cache: Mutex::new(cache),
            capacity: config.capacity,
        })
    }

    /// Get a resource from the cache, falling back to disk
    ///
    /// # Arguments
    /// * `path` - Request path, also the cache key
    ///
    /// # Returns
    /// * `Result<Resource>` - Content type and payload
    pub fn get(&self, path: &str) -> Result<Resource> {
        // Try cache first
        if let Some(entry) = self.cache.lock().get(path) {
            trace!(path, "cache hit");
            return Ok(entry.to_resource());
        }

        // Cache miss - load from disk without holding the lock
        let resource = self.store.load(path)?;

        let mut cache = self.cache.lock();
        // Another caller may have filled it meanwhile
        if !cache.contains(path) {
            cache.put(path, resource.content_type.as_str(), resource.payload.as_slice());
        }

        Ok(resource)
    }

    /// Put a resource straight into the cache
    pub fn put(&self, path: &str, content_type: &str, payload: &[u8]) {
        self.cache.lock().put(path, content_type, payload);
    }

    /// Get cache statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.cache.lock().stats().snapshot()
    }

    /// Get current cache size
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the cache (files on disk are untouched)
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
        cache.stats().reset();
    }

    /// Backing file store
    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::Error;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn root_with(files: &[(&str, &[u8])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, data) in files {
            fs::write(dir.path().join(name), data).unwrap();
        }
        dir
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let dir = root_with(&[("index.html", b"<h1>hi</h1>")]);
        let cached = CachedStore::new(dir.path(), 10).unwrap();

        let first = cached.get("/index.html").unwrap();
        assert_eq!(first.payload, b"<h1>hi</h1>");
        assert_eq!(first.content_type, "text/html");
        assert_eq!(cached.stats().misses, 1);

        let second = cached.get("/index.html").unwrap();
        assert_eq!(second, first);
        assert_eq!(cached.stats().hits, 1);
        assert_eq!(cached.cache_len(), 1);
    }

    #[test]
    fn test_cached_copy_survives_file_change() {
        let dir = root_with(&[("a.txt", b"v1")]);
        let cached = CachedStore::new(dir.path(), 10).unwrap();

        cached.get("/a.txt").unwrap();
        fs::write(dir.path().join("a.txt"), b"v2").unwrap();

        assert_eq!(cached.get("/a.txt").unwrap().payload, b"v1");
    }

    #[test]
    fn test_cache_eviction() {
        let dir = root_with(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
        let cached = CachedStore::new(dir.path(), 2).unwrap();

        cached.get("/a.txt").unwrap();
        cached.get("/b.txt").unwrap();
        cached.get("/c.txt").unwrap();

        assert_eq!(cached.cache_len(), 2);
        assert_eq!(cached.stats().evictions, 1);

        // a was evicted, so this goes back to disk
        cached.get("/a.txt").unwrap();
        assert_eq!(cached.stats().misses, 4);
    }

    #[test]
    fn test_not_found() {
        let dir = root_with(&[]);
        let cached = CachedStore::new(dir.path(), 2).unwrap();

        let err = cached.get("/missing.html").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(cached.cache_len(), 0);
    }

    #[test]
    fn test_invalid_capacity() {
        let dir = root_with(&[]);
        let result = CachedStore::new(dir.path(), 0);
        assert!(matches!(result, Err(Error::InvalidCapacity(0))));
    }

    #[test]
    fn test_put_without_backing_file() {
        let dir = root_with(&[]);
        let cached = CachedStore::new(dir.path(), 2).unwrap();

        cached.put("/generated.json", "application/json", b"{}");

        let resource = cached.get("/generated.json").unwrap();
        assert_eq!(resource.content_type, "application/json");
        assert_eq!(resource.payload, b"{}");
    }

    #[test]
    fn test_clear_cache() {
        let dir = root_with(&[("a.txt", b"a")]);
        let cached = CachedStore::new(dir.path(), 2).unwrap();

        cached.get("/a.txt").unwrap();
        cached.clear_cache();

        assert_eq!(cached.cache_len(), 0);
        assert_eq!(cached.stats().misses, 0);
    }

    #[test]
    fn test_concurrent_gets() {
        let dir = root_with(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
        let config = CacheConfig {
            duplicate_policy: DuplicatePolicy::Replace,
            ..CacheConfig::with_capacity(2)
        };
        let cached = Arc::new(CachedStore::with_config(dir.path(), config).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cached = Arc::clone(&cached);
                thread::spawn(move || {
                    for i in 0..200 {
                        let path = ["/a.txt", "/b.txt", "/c.txt"][(i + t) % 3];
                        let resource = cached.get(path).unwrap();
                        assert_eq!(resource.payload, &path.as_bytes()[1..2]);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cached.cache_len() <= 2);
        cached.cache.lock().check_invariants().unwrap();
    }
}
