//! Error types for pathcache

use std::fmt;

/// Result type alias for pathcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug)]
pub enum Error {
    /// Capacity must be at least one entry
    InvalidCapacity(usize),

    /// Tail removal on a recency list with no entries
    EmptyList,

    /// Backing store failed to produce a resource
    Store(filestore::Error),
}

impl Error {
    /// Whether the backing store had nothing servable at the path
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(e) if e.is_not_found())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(capacity) => {
                write!(f, "Invalid cache capacity: {} (must be at least 1)", capacity)
            }
            Error::EmptyList => write!(f, "Recency list is empty"),
            Error::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<filestore::Error> for Error {
    fn from(err: filestore::Error) -> Self {
        Error::Store(err)
    }
}

/// A broken list/index invariant, reported by `Cache::check_invariants`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Which invariant failed
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}
