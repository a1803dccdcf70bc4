//! Error types for filestore

use std::fmt;
use std::io;

/// Result type alias for filestore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for resource loading
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Root directory is missing or not a directory
    InvalidRoot(String),

    /// Request path escapes the root or is otherwise malformed
    InvalidPath(String),

    /// Resource too large (max 16 MiB)
    ResourceTooLarge(u64),

    /// No file at the requested path
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidRoot(root) => write!(f, "Invalid root directory: {}", root),
            Error::InvalidPath(path) => write!(f, "Invalid request path: {}", path),
            Error::ResourceTooLarge(size) => {
                write!(f, "Resource too large: {} bytes (max 16 MiB)", size)
            }
            Error::NotFound(path) => write!(f, "Resource not found: {}", path),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl Error {
    /// Whether the error means "nothing servable at this path"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InvalidPath(_))
    }
}
