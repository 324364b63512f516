//! Sparse nBOW vector keyed by vocabulary index

use super::TokenWeights;
use crate::models::VocabularyIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Vocabulary index → weight, L2-normalised
///
/// Keys are always valid indices of the vocabulary the vector was built
/// against. Tokens the vocabulary does not know are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector {
    entries: BTreeMap<u32, f32>,
}

impl SparseVector {
    /// Project token weights onto the vocabulary
    ///
    /// Weights of tokens that map to the same index are summed, and the
    /// result is rescaled to unit length so that dropping out-of-vocabulary
    /// tokens never leaves a shorter vector behind.
    pub fn from_weights(weights: &TokenWeights, vocabulary: &VocabularyIndex) -> Self {
        let mut summed: BTreeMap<u32, f64> = BTreeMap::new();

        for (token, weight) in weights.iter() {
            if let Some(index) = vocabulary.index_of(token) {
                *summed.entry(index).or_insert(0.0) += weight;
            }
        }

        Self::normalize_f64(summed)
    }

    fn normalize_f64(summed: BTreeMap<u32, f64>) -> Self {
        let norm = summed.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Self::default();
        }

        let entries = summed
            .into_iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(index, weight)| (index, (weight / norm) as f32))
            .collect();

        Self { entries }
    }

    /// Euclidean length of the vector
    pub fn norm(&self) -> f64 {
        self.entries
            .values()
            .map(|&w| f64::from(w) * f64::from(w))
            .sum::<f64>()
            .sqrt()
    }

    /// Copy of the vector rescaled to unit length
    pub fn normalized(&self) -> Self {
        Self::normalize_f64(
            self.entries
                .iter()
                .map(|(&index, &weight)| (index, f64::from(weight)))
                .collect(),
        )
    }

    pub fn get(&self, index: u32) -> Option<f32> {
        self.entries.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(index, weight)` in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.entries.iter().map(|(&index, &weight)| (index, weight))
    }

    /// Entries sorted by descending weight, ties broken by index
    pub fn top(&self, limit: usize) -> Vec<(u32, f32)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.truncate(limit);
        entries
    }
}

impl FromIterator<(u32, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (u32, f32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
