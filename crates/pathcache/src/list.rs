//! Recency list: doubly-linked over arena handles
//!
//! Head is the most-recently-used entry, tail the least. All operations
//! are O(1); none of them allocates or frees arena slots.

use crate::entry::{EntryArena, EntryId};
use crate::error::{Error, Result};

/// Head/tail bookkeeping for the entries linked through an [`EntryArena`]
#[derive(Debug, Default)]
pub(crate) struct RecencyList {
    head: Option<EntryId>,
    tail: Option<EntryId>,
    len: usize,
}

impl RecencyList {
    pub(crate) fn head(&self) -> Option<EntryId> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<EntryId> {
        self.tail
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Link an unlinked entry in as the most-recently-used one
    pub(crate) fn insert_at_head(&mut self, arena: &mut EntryArena, id: EntryId) {
        debug_assert_eq!(arena.links(id), Some((None, None)));
        debug_assert_ne!(self.head, Some(id));

        self.attach_head(arena, id);
        self.len += 1;
    }

    /// Relink a linked entry at the head, keeping everyone else's order
    pub(crate) fn move_to_head(&mut self, arena: &mut EntryArena, id: EntryId) {
        if self.head == Some(id) {
            return;
        }

        self.detach(arena, id);
        self.attach_head(arena, id);
    }

    /// Detach the least-recently-used entry. The slot stays allocated.
    pub(crate) fn remove_tail(&mut self, arena: &mut EntryArena) -> Result<EntryId> {
        let tail = self.tail.ok_or(Error::EmptyList)?;

        self.detach(arena, tail);
        self.len -= 1;

        Ok(tail)
    }

    /// Detach an arbitrary linked entry. The slot stays allocated.
    pub(crate) fn unlink(&mut self, arena: &mut EntryArena, id: EntryId) {
        self.detach(arena, id);
        self.len -= 1;
    }

    /// Walk handles from head (MRU) to tail (LRU)
    pub(crate) fn iter<'a>(&self, arena: &'a EntryArena) -> Iter<'a> {
        Iter {
            arena,
            cursor: self.head,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn attach_head(&mut self, arena: &mut EntryArena, id: EntryId) {
        let old_head = self.head;

        arena.set_prev(id, None);
        arena.set_next(id, old_head);

        match old_head {
            Some(head) => arena.set_prev(head, Some(id)),
            None => self.tail = Some(id),
        }

        self.head = Some(id);
    }

    fn detach(&mut self, arena: &mut EntryArena, id: EntryId) {
        let (prev, next) = match arena.links(id) {
            Some(links) => links,
            None => return,
        };

        match prev {
            Some(prev) => arena.set_next(prev, next),
            None => {
                debug_assert_eq!(self.head, Some(id), "unlinked entry has no prev");
                self.head = next;
            }
        }

        match next {
            Some(next) => arena.set_prev(next, prev),
            None => {
                debug_assert_eq!(self.tail, Some(id), "unlinked entry has no next");
                self.tail = prev;
            }
        }

        arena.set_prev(id, None);
        arena.set_next(id, None);
    }
}

/// Iterator over linked handles, MRU first
pub(crate) struct Iter<'a> {
    arena: &'a EntryArena,
    cursor: Option<EntryId>,
}

impl Iterator for Iter<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let id = self.cursor?;
        self.cursor = self.arena.links(id).and_then(|(_, next)| next);
        Some(id)
    }
}
