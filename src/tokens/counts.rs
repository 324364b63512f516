//! Per-repository token occurrence counts

use std::collections::BTreeMap;

/// Occurrence count of every sub-token seen in a repository
///
/// Each file worker builds its own `TokenCounts`; the converter merges them
/// in a single aggregation step. Merging is addition, so the result does not
/// depend on the order in which files finish. Keys are kept sorted so that
/// everything computed from the counts iterates in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCounts {
    counts: BTreeMap<String, u64>,
}

impl TokenCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `token`
    pub fn add(&mut self, token: impl Into<String>) {
        *self.counts.entry(token.into()).or_insert(0) += 1;
    }

    /// Record one occurrence of every token in `tokens`
    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            self.add(token);
        }
    }

    /// Fold another set of counts into this one
    pub fn merge(&mut self, other: TokenCounts) {
        for (token, count) in other.counts {
            *self.counts.entry(token).or_insert(0) += count;
        }
    }

    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of occurrences across all tokens
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate over `(token, count)` in token order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(token, &count)| (token.as_str(), count))
    }

    /// Keep only the tokens for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.counts.retain(|token, _| keep(token));
    }
}

impl<S: Into<String>> FromIterator<S> for TokenCounts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counts = TokenCounts::new();
        counts.extend(iter);
        counts
    }
}
