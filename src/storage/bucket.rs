//! Result bucket abstraction
//!
//! Written results can be mirrored to a bucket. Only local buckets
//! (`file://` URIs or plain directories) are implemented; other backends
//! plug in through [`ObjectStore`].

use super::write_atomic;
use crate::error::{PersistenceError, PersistenceResult};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Flat key → bytes store
pub trait ObjectStore: Send + Sync {
    /// URI of the bucket, for logs and errors
    fn uri(&self) -> &str;

    fn exists(&self, key: &str) -> PersistenceResult<bool>;

    fn put(&self, key: &str, bytes: &[u8]) -> PersistenceResult<()>;

    fn get(&self, key: &str) -> PersistenceResult<Vec<u8>>;
}

/// Bucket backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalBucket {
    root: PathBuf,
    uri: String,
}

impl LocalBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let uri = format!("file://{}", root.display());
        Self { root, uri }
    }

    /// Open a bucket from a `file://` URI or a plain path
    pub fn from_uri(uri: &str) -> PersistenceResult<Self> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Ok(Self::new(path));
        }
        if uri.contains("://") {
            return Err(PersistenceError::Upload {
                bucket: uri.to_string(),
                key: String::new(),
                reason: "unsupported bucket scheme, use file:// or a directory".to_string(),
            });
        }
        Ok(Self::new(uri))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path inside the bucket, rejecting escapes
    fn path_for(&self, key: &str) -> PersistenceResult<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !valid {
            return Err(PersistenceError::Upload {
                bucket: self.uri.clone(),
                key: key.to_string(),
                reason: "keys must be relative paths without '..'".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalBucket {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn exists(&self, key: &str) -> PersistenceResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> PersistenceResult<()> {
        let path = self.path_for(key)?;
        write_atomic(&path, bytes).map_err(|e| PersistenceError::Upload {
            bucket: self.uri.clone(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn get(&self, key: &str) -> PersistenceResult<Vec<u8>> {
        let path = self.path_for(key)?;
        std::fs::read(&path).map_err(|source| PersistenceError::Read { path, source })
    }
}

/// Open the bucket named by `uri`
pub fn open_bucket(uri: &str) -> PersistenceResult<Arc<dyn ObjectStore>> {
    Ok(Arc::new(LocalBucket::from_uri(uri)?))
}
