//! Vocabulary index: bidirectional token ↔ dense index mapping

use super::id::{ModelId, read_source};
use crate::error::{ModelError, ModelResult};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct VocabularyFile {
    tokens: Vec<String>,
}

/// Immutable token table of a pretrained embedding model
///
/// Indices are the contiguous range `[0, len)`, one per token, in the order
/// the tokens were given.
#[derive(Debug, Clone)]
pub struct VocabularyIndex {
    tokens: Vec<String>,
    index: HashMap<String, u32>,
    id: ModelId,
}

impl VocabularyIndex {
    pub const MODEL: &'static str = "vocabulary";

    /// Build an in-memory vocabulary; rejects duplicate tokens
    pub fn from_tokens<I, S>(tokens: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let content = tokens.join("\n");
        Self::build(tokens, ModelId::new(Self::MODEL, "memory", content.as_bytes()))
    }

    /// Load a vocabulary from JSON (`{"tokens": [...]}`) or plain text
    /// (one token per line)
    pub fn load(source: &str) -> ModelResult<Self> {
        let bytes = read_source(source)?;
        let text = std::str::from_utf8(&bytes).map_err(|e| ModelError::Format {
            source_path: source.to_string(),
            reason: format!("not valid UTF-8: {e}"),
        })?;

        let tokens = if text.trim_start().starts_with('{') {
            serde_json::from_str::<VocabularyFile>(text)
                .map_err(|e| ModelError::Format {
                    source_path: source.to_string(),
                    reason: e.to_string(),
                })?
                .tokens
        } else {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };

        let vocabulary = Self::build(tokens, ModelId::new(Self::MODEL, source, &bytes))
            .map_err(|e| match e {
                ModelError::Invalid { reason, .. } => ModelError::Invalid {
                    source_path: source.to_string(),
                    reason,
                },
                other => other,
            })?;

        tracing::debug!(
            source,
            tokens = vocabulary.len(),
            "loaded vocabulary {}",
            vocabulary.id.short()
        );
        Ok(vocabulary)
    }

    fn build(tokens: Vec<String>, id: ModelId) -> ModelResult<Self> {
        if tokens.len() > u32::MAX as usize {
            return Err(ModelError::Invalid {
                source_path: id.source.clone(),
                reason: format!("{} tokens exceed the index range", tokens.len()),
            });
        }

        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i as u32).is_some() {
                return Err(ModelError::Invalid {
                    source_path: id.source.clone(),
                    reason: format!("duplicate token '{token}'"),
                });
            }
        }

        Ok(Self { tokens, index, id })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn index_of(&self, token: &str) -> Option<u32> {
        self.index.get(token).copied()
    }

    pub fn token_at(&self, index: u32) -> Option<&str> {
        self.tokens.get(index as usize).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }
}
