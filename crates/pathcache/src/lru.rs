//! LRU cache engine
//!
//! Composes the recency list and the key index over one entry arena. Every
//! public mutation updates list and index together, so between calls the
//! index reaches exactly the reachable nodes of the list.

use std::collections::HashSet;

use tracing::{debug, error, trace};

use crate::config::{CacheConfig, DuplicatePolicy};
use crate::entry::{CacheEntry, EntryArena, EntryId};
use crate::error::{Error, InvariantError, Result};
use crate::index::{HashIndex, KeyIndex};
use crate::list::RecencyList;
use crate::stats::CacheStats;

/// Fixed-capacity cache of path-keyed payloads with LRU eviction
///
/// Single-threaded: callers sharing a cache across threads must serialize
/// access themselves (see [`CachedStore`](crate::CachedStore)).
#[derive(Debug)]
pub struct Cache<I = HashIndex> {
    arena: EntryArena,
    list: RecencyList,
    index: I,
    capacity: usize,
    policy: DuplicatePolicy,
    stats: CacheStats,
}

impl Cache<HashIndex> {
    /// Create an empty cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be at least 1
    /// * `index_size_hint` - Initial key index size, 0 for the default
    ///
    /// # Returns
    /// * `Result<Cache>` - Empty cache, or `InvalidCapacity` for 0
    pub fn new(capacity: usize, index_size_hint: usize) -> Result<Self> {
        Self::with_config(CacheConfig {
            capacity,
            index_size_hint,
            ..CacheConfig::default()
        })
    }
}

impl<I: KeyIndex> Cache<I> {
    /// Create an empty cache with an explicit config and index type
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(Error::InvalidCapacity(config.capacity));
        }

        Ok(Self {
            // One spare slot: a put links the new node before evicting
            arena: EntryArena::with_capacity(config.capacity + 1),
            list: RecencyList::default(),
            index: I::with_size_hint(config.index_size_hint),
            capacity: config.capacity,
            policy: config.duplicate_policy,
            stats: CacheStats::new(),
        })
    }

    /// Store a payload under `key` as the most-recently-used entry
    ///
    /// Evicts the least-recently-used entry if the cache overflows. What
    /// happens to an existing entry for `key` depends on the
    /// [`DuplicatePolicy`].
    pub fn put(
        &mut self,
        key: impl Into<String>,
        content_type: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) {
        let key = key.into();

        if let Some(existing) = self.index.get(&key) {
            match self.policy {
                DuplicatePolicy::Orphan => {
                    // Legacy quirk: the old node keeps its capacity slot but
                    // is unreachable once the index points at the new one.
                    trace!(key = %key, "duplicate put orphans previous entry");
                    self.stats.record_orphan();
                }
                DuplicatePolicy::Replace => {
                    self.list.unlink(&mut self.arena, existing);
                    self.index.remove(&key);
                    self.arena.free(existing);
                    self.stats.record_replacement();
                }
            }
        }

        let entry = CacheEntry::new(key, content_type.into(), payload.into());
        let id = self.arena.alloc(entry);
        self.list.insert_at_head(&mut self.arena, id);
        if let Some(entry) = self.arena.entry(id) {
            self.index.insert(entry.key(), id);
        }
        self.stats.record_insert();

        if self.list.len() > self.capacity {
            self.evict_lru();
        }
    }

    /// Look up `key`, promoting it to most-recently-used on a hit
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let id = match self.index.get(key) {
            Some(id) => id,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        self.list.move_to_head(&mut self.arena, id);
        self.stats.record_hit();
        self.arena.entry(id)
    }

    /// Look up `key` without touching recency or stats
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.index.get(key).and_then(|id| self.arena.entry(id))
    }

    /// Whether `key` is reachable
    pub fn contains(&self, key: &str) -> bool {
        self.index.get(key).is_some()
    }

    /// Remove and return the reachable entry for `key`
    ///
    /// Orphaned nodes sharing the key stay linked until evicted.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let id = self.index.remove(key)?;
        self.list.unlink(&mut self.arena, id);
        self.arena.free(id)
    }

    /// Destroy every entry; the cache stays usable
    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
        self.arena.clear();
    }

    /// Number of linked nodes, orphans included
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether the cache holds no nodes
    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    /// Maximum number of nodes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Duplicate-key handling in effect
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Activity counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Entries from most- to least-recently-used, orphans included
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> + '_ {
        self.list
            .iter(&self.arena)
            .filter_map(move |id| self.arena.entry(id))
    }

    /// Keys in recency order, MRU first
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(CacheEntry::key)
    }

    /// Verify list/index consistency
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let len = self.list.len();

        if len > self.capacity {
            return Err(InvariantError::new(format!(
                "size {} exceeds capacity {}",
                len, self.capacity
            )));
        }
        if self.arena.len() != len {
            return Err(InvariantError::new(format!(
                "arena holds {} entries but list links {}",
                self.arena.len(),
                len
            )));
        }
        if self.list.head().is_none() != (len == 0) || self.list.tail().is_none() != (len == 0) {
            return Err(InvariantError::new("head/tail presence disagrees with size"));
        }

        let mut linked = HashSet::with_capacity(len);
        let mut prev: Option<EntryId> = None;
        let mut cursor = self.list.head();
        while let Some(id) = cursor {
            if linked.len() == len || !linked.insert(id) {
                return Err(InvariantError::new("recency list has a cycle or extra nodes"));
            }
            let (node_prev, node_next) = self
                .arena
                .links(id)
                .ok_or_else(|| InvariantError::new("linked handle points at a free slot"))?;
            if node_prev != prev {
                return Err(InvariantError::new(format!(
                    "prev link of slot {} disagrees with its neighbor",
                    id.index()
                )));
            }
            prev = Some(id);
            cursor = node_next;
        }
        if linked.len() != len {
            return Err(InvariantError::new(format!(
                "walked {} nodes but size is {}",
                linked.len(),
                len
            )));
        }
        if prev != self.list.tail() {
            return Err(InvariantError::new("walk did not end at the tail"));
        }

        let mut broken = None;
        self.index.for_each(&mut |key, id| {
            if broken.is_some() {
                return;
            }
            match self.arena.entry(id) {
                Some(entry) if entry.key() == key && linked.contains(&id) => {}
                _ => broken = Some(key.to_string()),
            }
        });
        if let Some(key) = broken {
            return Err(InvariantError::new(format!(
                "index entry {:?} does not reach a live node with that key",
                key
            )));
        }

        if self.index.len() > len {
            return Err(InvariantError::new("index has more keys than the list has nodes"));
        }
        if self.policy == DuplicatePolicy::Replace && self.index.len() != len {
            return Err(InvariantError::new("replace policy left an unreachable node"));
        }

        Ok(())
    }

    fn evict_lru(&mut self) {
        let tail = match self.list.remove_tail(&mut self.arena) {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "eviction found no tail");
                return;
            }
        };

        // An orphan shares its key with a newer node; only drop the index
        // entry if it still points here.
        if let Some(entry) = self.arena.entry(tail) {
            if self.index.get(entry.key()) == Some(tail) {
                self.index.remove(entry.key());
            }
        }

        if let Some(evicted) = self.arena.free(tail) {
            self.stats.record_eviction();
            debug!(key = evicted.key(), bytes = evicted.len(), "evicted least-recently-used entry");
        }
    }
}
