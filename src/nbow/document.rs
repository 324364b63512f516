//! Persisted `{meta, nbow}` document
//!
//! One JSON file per repository. The metadata names the two models that
//! produced the vector so readers can tell which snapshot a result belongs
//! to. Nothing time-dependent is recorded, so regenerating a result with
//! the same models writes the same bytes.

use super::SparseVector;
use crate::error::{PersistenceError, PersistenceResult};
use crate::models::ModelId;
use crate::storage::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata stored next to the vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbowMeta {
    /// Always `nbow`
    pub model: String,

    /// Version of the document format
    pub version: u32,

    /// Vocabulary and document frequency identities, in that order
    pub dependencies: Vec<ModelId>,

    /// Local path or remote URL of the converted repository
    pub repository: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbowDocument {
    pub meta: NbowMeta,
    pub nbow: SparseVector,
}

impl NbowDocument {
    pub const MODEL: &'static str = "nbow";

    /// Current document format version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(
        repository: impl Into<String>,
        vocabulary: &ModelId,
        docfreq: &ModelId,
        nbow: SparseVector,
    ) -> Self {
        Self {
            meta: NbowMeta {
                model: Self::MODEL.to_string(),
                version: Self::CURRENT_VERSION,
                dependencies: vec![vocabulary.clone(), docfreq.clone()],
                repository: repository.into(),
            },
            nbow,
        }
    }

    /// Serialise to pretty JSON bytes
    pub fn to_bytes(&self, path: &Path) -> PersistenceResult<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|source| PersistenceError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Write the document to `path` atomically
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is renamed over `path`, so readers never see a half-written result.
    pub fn save(&self, path: &Path) -> PersistenceResult<()> {
        let bytes = self.to_bytes(path)?;
        write_atomic(path, &bytes)
    }

    /// Read a document back from `path`
    pub fn load(path: &Path) -> PersistenceResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &bytes)
    }

    pub fn from_bytes(path: &Path, bytes: &[u8]) -> PersistenceResult<Self> {
        let document: Self =
            serde_json::from_slice(bytes).map_err(|source| PersistenceError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;

        if document.meta.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "document version {} is newer than supported version {}",
                        document.meta.version,
                        Self::CURRENT_VERSION
                    ),
                ),
            });
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn document() -> NbowDocument {
        let vocab = ModelId::new("vocabulary", "memory", b"test\nuser");
        let docfreq = ModelId::new("docfreq", "memory", b"{}");
        NbowDocument::new(
            "/src/project",
            &vocab,
            &docfreq,
            [(0, 0.6), (1, 0.8)].into_iter().collect(),
        )
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("nbow_project.json");

        document().save(&path).unwrap();
        let loaded = NbowDocument::load(&path).unwrap();

        assert_eq!(loaded, document());
        assert_eq!(loaded.meta.model, "nbow");
        assert_eq!(loaded.meta.dependencies.len(), 2);
        assert_eq!(loaded.meta.dependencies[0].model, "vocabulary");
    }

    #[test]
    fn test_regenerated_file_is_identical() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nbow_project.json");

        document().save(&path).unwrap();
        let first = std::fs::read(&path).unwrap();
        document().save(&path).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        // No temp files left behind
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_future_version_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nbow_future.json");

        let mut future = document();
        future.meta.version = 999;
        std::fs::write(&path, serde_json::to_vec(&future).unwrap()).unwrap();

        let err = NbowDocument::load(&path).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = NbowDocument::load(&temp_dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.status_code(), "READ_ERROR");
    }
}
