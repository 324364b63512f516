//! Document frequency table used for inverse document frequency weighting

use super::id::{ModelId, read_source};
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize, Deserialize)]
struct FrequencyFile {
    docs: u64,
    df: BTreeMap<String, u64>,
}

/// Immutable token → document frequency mapping
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    docs: u64,
    df: HashMap<String, u64>,
    id: ModelId,
}

impl FrequencyTable {
    pub const MODEL: &'static str = "docfreq";

    /// Build an in-memory table from `docs` observed documents and
    /// per-token counts
    pub fn from_counts<I, S>(docs: u64, counts: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let df: BTreeMap<String, u64> = counts
            .into_iter()
            .map(|(token, count)| (token.into(), count))
            .collect();

        // Hash the canonical JSON so equal tables share an identity
        let canonical = serde_json::to_vec(&FrequencyFile {
            docs,
            df: df.clone(),
        })
        .map_err(|e| ModelError::Format {
            source_path: "memory".to_string(),
            reason: e.to_string(),
        })?;

        Self::build(docs, df, ModelId::new(Self::MODEL, "memory", &canonical))
    }

    /// Load a table from JSON: `{"docs": N, "df": {"token": count, ...}}`
    pub fn load(source: &str) -> ModelResult<Self> {
        let bytes = read_source(source)?;
        let file: FrequencyFile =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Format {
                source_path: source.to_string(),
                reason: e.to_string(),
            })?;

        let table = Self::build(file.docs, file.df, ModelId::new(Self::MODEL, source, &bytes))?;

        tracing::debug!(
            source,
            docs = table.docs,
            tokens = table.len(),
            "loaded document frequencies {}",
            table.id.short()
        );
        Ok(table)
    }

    fn build(docs: u64, df: BTreeMap<String, u64>, id: ModelId) -> ModelResult<Self> {
        if docs == 0 {
            return Err(ModelError::Invalid {
                source_path: id.source.clone(),
                reason: "document count must be positive".to_string(),
            });
        }

        Ok(Self {
            docs,
            df: df.into_iter().collect(),
            id,
        })
    }

    /// Total number of documents the table was built from
    pub fn docs(&self) -> u64 {
        self.docs
    }

    /// Document frequency of `token`; absent tokens count as 0
    pub fn get(&self, token: &str) -> u64 {
        self.df.get(token).copied().unwrap_or(0)
    }

    /// Inverse document frequency `ln(docs / max(df, floor))`, never negative
    pub fn idf(&self, token: &str, floor: u64) -> f64 {
        let df = self.get(token).max(floor).max(1);
        (self.docs as f64 / df as f64).ln().max(0.0)
    }

    pub fn len(&self) -> usize {
        self.df.len()
    }

    pub fn is_empty(&self) -> bool {
        self.df.is_empty()
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }
}
