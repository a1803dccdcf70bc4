//! Key index: maps resource paths to arena handles
//!
//! The cache engine only relies on the [`KeyIndex`] contract; [`HashIndex`]
//! is the stock implementation. Inserting an existing key overwrites the
//! previous handle so lookups always reach the most recent insertion.

use std::collections::HashMap;

use ahash::RandomState;

use crate::entry::EntryId;

/// Slot count used when the caller passes a size hint of zero
pub const DEFAULT_INDEX_SIZE: usize = 128;

/// Associative lookup from key to entry handle
///
/// An index never owns entries; dropping it leaves the arena untouched.
pub trait KeyIndex {
    /// Create an empty index. A hint of zero selects [`DEFAULT_INDEX_SIZE`].
    fn with_size_hint(size_hint: usize) -> Self
    where
        Self: Sized;

    /// Associate `key` with `id`, returning the handle it replaced
    fn insert(&mut self, key: &str, id: EntryId) -> Option<EntryId>;

    /// Look up the handle for `key`
    fn get(&self, key: &str) -> Option<EntryId>;

    /// Drop the association for `key`
    fn remove(&mut self, key: &str) -> Option<EntryId>;

    /// Number of keys
    fn len(&self) -> usize;

    /// Whether no keys are indexed
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every association
    fn clear(&mut self);

    /// Visit every `(key, handle)` pair
    fn for_each(&self, f: &mut dyn FnMut(&str, EntryId));
}

/// [`KeyIndex`] backed by a `HashMap` with the aHash hasher
#[derive(Debug, Clone)]
pub struct HashIndex {
    map: HashMap<String, EntryId, RandomState>,
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::with_size_hint(0)
    }
}

impl KeyIndex for HashIndex {
    fn with_size_hint(size_hint: usize) -> Self {
        let size = if size_hint == 0 {
            DEFAULT_INDEX_SIZE
        } else {
            size_hint
        };

        Self {
            map: HashMap::with_capacity_and_hasher(size, RandomState::new()),
        }
    }

    fn insert(&mut self, key: &str, id: EntryId) -> Option<EntryId> {
        self.map.insert(key.to_owned(), id)
    }

    fn get(&self, key: &str) -> Option<EntryId> {
        self.map.get(key).copied()
    }

    fn remove(&mut self, key: &str) -> Option<EntryId> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, EntryId)) {
        for (key, id) in &self.map {
            f(key, *id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{CacheEntry, EntryArena};

    fn handles(n: usize) -> Vec<EntryId> {
        let mut arena = EntryArena::default();
        (0..n)
            .map(|i| arena.alloc(CacheEntry::new(i.to_string(), String::new(), Vec::new())))
            .collect()
    }

    #[test]
    fn test_insert_get_remove() {
        let ids = handles(2);
        let mut index = HashIndex::with_size_hint(16);

        assert_eq!(index.insert("/a", ids[0]), None);
        assert_eq!(index.insert("/b", ids[1]), None);
        assert_eq!(index.get("/a"), Some(ids[0]));
        assert_eq!(index.len(), 2);

        assert_eq!(index.remove("/a"), Some(ids[0]));
        assert_eq!(index.get("/a"), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut index = HashIndex::default();

        assert_eq!(index.remove("/missing"), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_insert_overwrites() {
        let ids = handles(2);
        let mut index = HashIndex::default();

        index.insert("/a", ids[0]);
        assert_eq!(index.insert("/a", ids[1]), Some(ids[0]));

        assert_eq!(index.get("/a"), Some(ids[1]));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_zero_hint_uses_default() {
        let index = HashIndex::with_size_hint(0);
        assert!(index.map.capacity() >= DEFAULT_INDEX_SIZE);
    }

    #[test]
    fn test_for_each_and_clear() {
        let ids = handles(3);
        let mut index = HashIndex::default();
        for (i, id) in ids.iter().enumerate() {
            index.insert(&format!("/{}", i), *id);
        }

        let mut seen = Vec::new();
        index.for_each(&mut |key, _| seen.push(key.to_string()));
        seen.sort();
        assert_eq!(seen, ["/0", "/1", "/2"]);

        index.clear();
        assert!(index.is_empty());
    }
}
