//! Output storage: atomic local writes and the optional result bucket

pub mod bucket;

pub use bucket::{LocalBucket, ObjectStore, open_bucket};

use crate::error::{PersistenceError, PersistenceResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `bytes` to `path` through a temporary file and a rename
///
/// The temporary file lives in the target directory so the rename never
/// crosses file systems.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> PersistenceResult<()> {
    let write_err = |source: std::io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(write_err)?;
    temp_file.write_all(bytes).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}
