//! # filestore
//!
//! Read-only resource producer that sits behind the pathcache LRU.
//!
//! ## Behavior
//! - Request paths resolve to files beneath a single root directory
//! - `/` and trailing-slash paths resolve to `index.html`
//! - Content type is derived from the file extension
//! - 16 MiB max resource size

#![warn(missing_docs)]

mod error;
pub mod mime;
mod store;

pub use error::{Error, Result};
pub use store::{FileStore, Resource, MAX_RESOURCE_SIZE};
