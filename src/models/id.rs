//! Model identity and source access
//!
//! Every output document records which model snapshots produced it. A
//! snapshot is identified by its source and the SHA256 of its content, so
//! two files with the same bytes are the same model wherever they live.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Identity of a loaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelId {
    /// Model kind, e.g. `vocabulary` or `docfreq`
    pub model: String,
    /// Where the model was loaded from (`memory` for in-process models)
    pub source: String,
    /// SHA256 of the model content
    pub sha256: String,
}

impl ModelId {
    pub fn new(model: &str, source: impl Into<String>, content: &[u8]) -> Self {
        Self {
            model: model.to_string(),
            source: source.into(),
            sha256: calculate_hash(content),
        }
    }

    /// Short form used in log lines
    pub fn short(&self) -> String {
        format!("{}@{}", self.model, &self.sha256[..12.min(self.sha256.len())])
    }
}

/// Calculate SHA256 hash of content
pub fn calculate_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Resolve a model location to a local path
///
/// Accepts plain paths and `file://` URIs.
pub fn resolve_source(source: &str) -> ModelResult<PathBuf> {
    if let Some(path) = source.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if source.contains("://") {
        return Err(ModelError::Format {
            source_path: source.to_string(),
            reason: "only local paths and file:// URIs can be loaded".to_string(),
        });
    }
    Ok(PathBuf::from(source))
}

/// Read the raw bytes of a model
pub fn read_source(source: &str) -> ModelResult<Vec<u8>> {
    let path = resolve_source(source)?;
    std::fs::read(&path).map_err(|cause| ModelError::Read {
        source_path: source.to_string(),
        cause,
    })
}
