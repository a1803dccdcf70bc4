//! Cache construction parameters

/// What `put` does when the key is already cached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Legacy behavior: always link a new node. The index moves to the new
    /// node and the old one lingers, unreachable, until it is evicted.
    #[default]
    Orphan,
    /// Destroy the old node first so each key has at most one node
    Replace,
}

/// Parameters for [`Cache::with_config`](crate::Cache::with_config)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries, at least 1
    pub capacity: usize,
    /// Initial key index size; 0 selects the index default
    pub index_size_hint: usize,
    /// Duplicate-key handling in `put`
    pub duplicate_policy: DuplicatePolicy,
}

impl CacheConfig {
    /// Config with the given capacity and defaults elsewhere
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            index_size_hint: 0,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
