//! File-backed resource producer
//!
//! Maps request paths like `/css/site.css` onto files beneath a root
//! directory. Every load hits the disk; callers put the pathcache LRU in
//! front of it.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::mime::content_type_for;

/// Maximum resource size (16 MiB)
pub const MAX_RESOURCE_SIZE: u64 = 16 * 1024 * 1024;

/// File served for `/` and any path ending in `/`
const INDEX_FILE: &str = "index.html";

/// A loaded resource: content type plus the full payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Content type label, e.g. `text/html`
    pub content_type: String,
    /// Raw file bytes
    pub payload: Vec<u8>,
}

/// FileStore serves files from a single root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Canonical root directory
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at the given directory
    ///
    /// # Arguments
    /// * `root` - Directory whose contents are served
    ///
    /// # Returns
    /// * `Result<FileStore>` - Store handle
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root)
            .map_err(|_| Error::InvalidRoot(root.display().to_string()))?;

        if !canonical.is_dir() {
            return Err(Error::InvalidRoot(root.display().to_string()));
        }

        Ok(FileStore { root: canonical })
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the resource behind a request path
    ///
    /// # Arguments
    /// * `path` - Request path, e.g. `/index.html`
    ///
    /// # Returns
    /// * `Result<Resource>` - Content type and payload
    pub fn load(&self, path: &str) -> Result<Resource> {
        let full = self.resolve(path)?;

        let metadata = match fs::metadata(&full) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path.to_string()))
            }
            Err(e) => return Err(Error::Io(e)),
        };

        if !metadata.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }

        // Symlinks must not lead outside the root
        let canonical = fs::canonicalize(&full)?;
        if !canonical.starts_with(&self.root) {
            return Err(Error::InvalidPath(path.to_string()));
        }

        if metadata.len() > MAX_RESOURCE_SIZE {
            return Err(Error::ResourceTooLarge(metadata.len()));
        }

        let payload = fs::read(&canonical)?;
        debug!(path, bytes = payload.len(), "loaded resource from disk");

        Ok(Resource {
            content_type: content_type_for(&full).to_string(),
            payload,
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut relative = path.trim_start_matches('/').to_string();
        if relative.is_empty() || relative.ends_with('/') {
            relative.push_str(INDEX_FILE);
        }

        let mut full = self.root.clone();
        for component in Path::new(&relative).components() {
            match component {
                Component::Normal(part) => full.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath(path.to_string()))
                }
            }
        }

        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &[u8])]) -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        for (name, data) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, data).unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = FileStore::open(dir.path().join("nope"));
        assert!(matches!(result, Err(Error::InvalidRoot(_))));
    }

    #[test]
    fn test_open_file_as_root() {
        let (dir, _store) = store_with(&[("plain.txt", b"x")]);
        let result = FileStore::open(dir.path().join("plain.txt"));
        assert!(matches!(result, Err(Error::InvalidRoot(_))));
    }

    #[test]
    fn test_load_file() {
        let (_dir, store) = store_with(&[("css/site.css", b"body {}")]);

        let resource = store.load("/css/site.css").unwrap();
        assert_eq!(resource.content_type, "text/css");
        assert_eq!(resource.payload, b"body {}");
    }

    #[test]
    fn test_load_index() {
        let (_dir, store) = store_with(&[("index.html", b"<h1>hi</h1>"), ("docs/index.html", b"docs")]);

        assert_eq!(store.load("/").unwrap().payload, b"<h1>hi</h1>");
        assert_eq!(store.load("").unwrap().payload, b"<h1>hi</h1>");
        assert_eq!(store.load("/docs/").unwrap().payload, b"docs");
    }

    #[test]
    fn test_load_not_found() {
        let (_dir, store) = store_with(&[]);

        let result = store.load("/missing.html");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_load_directory_is_not_found() {
        let (_dir, store) = store_with(&[("docs/a.txt", b"a")]);

        let result = store.load("/docs");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let (_dir, store) = store_with(&[("index.html", b"x")]);

        let result = store.load("/../etc/passwd");
        assert!(matches!(result, Err(Error::InvalidPath(_))));

        let result = store.load("/docs/../../secret");
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_empty_file() {
        let (_dir, store) = store_with(&[("empty.txt", b"")]);

        let resource = store.load("/empty.txt").unwrap();
        assert!(resource.payload.is_empty());
        assert_eq!(resource.content_type, "text/plain");
    }
}
