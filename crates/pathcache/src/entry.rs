//! Cache entries and their arena storage
//!
//! Every live entry sits in an [`EntryArena`] slot addressed by an
//! [`EntryId`]. The recency list links slots through `prev`/`next` handles
//! and the key index maps keys to handles, so neither holds a reference
//! into the other.

use filestore::Resource;

/// Opaque handle to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

impl EntryId {
    /// Slot position inside the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A cached payload keyed by resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    key: String,
    content_type: String,
    payload: Box<[u8]>,
}

impl CacheEntry {
    pub(crate) fn new(key: String, content_type: String, payload: Vec<u8>) -> Self {
        Self {
            key,
            content_type,
            payload: payload.into_boxed_slice(),
        }
    }

    /// Resource path this entry is stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Content type label, never interpreted by the cache
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Copy this entry out as a store resource
    pub fn to_resource(&self) -> Resource {
        Resource {
            content_type: self.content_type.clone(),
            payload: self.payload.to_vec(),
        }
    }
}

/// Arena slot: an entry plus its recency links
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) entry: CacheEntry,
    pub(crate) prev: Option<EntryId>,
    pub(crate) next: Option<EntryId>,
}

/// Slot storage for entries with a free list for reuse
#[derive(Debug, Default)]
pub(crate) struct EntryArena {
    slots: Vec<Option<Node>>,
    free_list: Vec<usize>,
    len: usize,
}

impl EntryArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Store an unlinked entry and hand back its handle
    pub(crate) fn alloc(&mut self, entry: CacheEntry) -> EntryId {
        let node = Node {
            entry,
            prev: None,
            next: None,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(node);
            idx
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        };
        self.len += 1;
        EntryId(idx)
    }

    /// Destroy a slot, returning its entry. The handle is dead afterwards.
    pub(crate) fn free(&mut self, id: EntryId) -> Option<CacheEntry> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(node.entry)
    }

    pub(crate) fn node(&self, id: EntryId) -> Option<&Node> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: EntryId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub(crate) fn entry(&self, id: EntryId) -> Option<&CacheEntry> {
        self.node(id).map(|node| &node.entry)
    }

    pub(crate) fn links(&self, id: EntryId) -> Option<(Option<EntryId>, Option<EntryId>)> {
        self.node(id).map(|node| (node.prev, node.next))
    }

    pub(crate) fn set_prev(&mut self, id: EntryId, prev: Option<EntryId>) {
        if let Some(node) = self.node_mut(id) {
            node.prev = prev;
        }
    }

    pub(crate) fn set_next(&mut self, id: EntryId, next: Option<EntryId>) {
        if let Some(node) = self.node_mut(id) {
            node.next = next;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}
