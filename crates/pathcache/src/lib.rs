//! # pathcache
//!
//! Fixed-capacity LRU cache mapping resource paths to payloads.
//!
//! ## Architecture
//! - **Arena**: entries live in slots addressed by `EntryId` handles
//! - **Recency list**: doubly-linked through handles, MRU at the head (O(1))
//! - **Key index**: path -> handle, aHash `HashMap` by default (O(1))
//! - **CachedStore**: mutex-guarded cache in front of a `FileStore`

#![warn(missing_docs)]

mod cached;
mod config;
mod entry;
mod error;
mod index;
mod list;
mod lru;
mod stats;

pub use cached::CachedStore;
pub use config::{CacheConfig, DuplicatePolicy};
pub use entry::{CacheEntry, EntryId};
pub use error::{Error, InvariantError, Result};
pub use filestore::Resource;
pub use index::{HashIndex, KeyIndex, DEFAULT_INDEX_SIZE};
pub use lru::Cache;
pub use stats::{CacheStats, StatsSnapshot};
