//! TF-IDF weighting with L2 normalisation

use crate::models::FrequencyTable;
use crate::tokens::TokenCounts;
use std::collections::BTreeMap;

/// Per-token weights of one repository, unit length unless empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenWeights {
    weights: BTreeMap<String, f64>,
}

impl TokenWeights {
    pub fn get(&self, token: &str) -> Option<f64> {
        self.weights.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterate over `(token, weight)` in token order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(token, &weight)| (token.as_str(), weight))
    }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }
}

/// Combines repository token counts with document frequencies
///
/// `weight = count * ln(docs / max(df, floor))`, then the whole set is
/// scaled to unit L2 norm. Tokens whose weight is zero are left out.
#[derive(Debug, Clone, Copy)]
pub struct Weighter {
    min_docfreq: u64,
}

impl Default for Weighter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Weighter {
    /// `min_docfreq` is the floor applied to document frequencies
    pub fn new(min_docfreq: u64) -> Self {
        Self {
            min_docfreq: min_docfreq.max(1),
        }
    }

    pub fn weight(&self, counts: &TokenCounts, freqs: &FrequencyTable) -> TokenWeights {
        let mut weights = BTreeMap::new();

        for (token, count) in counts.iter() {
            let weight = count as f64 * freqs.idf(token, self.min_docfreq);
            if weight > 0.0 {
                weights.insert(token.to_string(), weight);
            }
        }

        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in weights.values_mut() {
                *weight /= norm;
            }
        }

        TokenWeights { weights }
    }
}
