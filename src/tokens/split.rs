//! Identifier splitting
//!
//! The vocabulary is trained on sub-tokens, not raw identifiers, so every
//! identifier is broken into its words before counting:
//!
//! 1. Split on the delimiter regex (default `[^A-Za-z0-9]+`), which takes
//!    care of snake_case, kebab-case and dotted names.
//! 2. Split each part on case boundaries:
//!    - lowercase or digit followed by uppercase (`getUser` → `get|User`)
//!    - an uppercase run followed by a lowercase letter splits before the
//!      last capital of the run (`HTTPResponse` → `HTTP|Response`)
//! 3. Lower-case every piece.
//! 4. Drop pieces shorter than `min_length` characters and pieces made of
//!    digits only.

use crate::config::TokenConfig;
use regex::Regex;

/// Parameters of the splitting rule
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    pub delimiter: Regex,
    pub min_length: usize,
    pub split_camel_case: bool,
}

impl SplitPolicy {
    /// Compile a policy from the `[tokens]` settings
    pub fn from_config(config: &TokenConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            delimiter: Regex::new(&config.delimiter)?,
            min_length: config.min_length,
            split_camel_case: config.split_camel_case,
        })
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            delimiter: Regex::new("[^A-Za-z0-9]+").expect("default delimiter is a valid regex"),
            min_length: 2,
            split_camel_case: true,
        }
    }
}

/// Splits identifiers into normalised sub-tokens
#[derive(Debug, Clone, Default)]
pub struct IdentifierSplitter {
    policy: SplitPolicy,
}

impl IdentifierSplitter {
    pub fn new(policy: SplitPolicy) -> Self {
        Self { policy }
    }

    /// Split one identifier into its sub-tokens, in source order
    pub fn split(&self, identifier: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        for part in self.policy.delimiter.split(identifier) {
            if part.is_empty() {
                continue;
            }
            if self.policy.split_camel_case {
                for word in split_camel_case(part) {
                    self.push_token(word, &mut tokens);
                }
            } else {
                self.push_token(part, &mut tokens);
            }
        }

        tokens
    }

    fn push_token(&self, word: &str, tokens: &mut Vec<String>) {
        if word.chars().count() < self.policy.min_length {
            return;
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            return;
        }
        tokens.push(word.to_lowercase());
    }
}

/// Split a camelCase or PascalCase word on its case boundaries
fn split_camel_case(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let (offset, ch) = chars[i];
        let prev = chars[i - 1].1;

        let boundary = if ch.is_uppercase() {
            // getUser, utf8Decoder
            prev.is_lowercase() || prev.is_ascii_digit()
        } else if ch.is_lowercase() && prev.is_uppercase() {
            // HTTPResponse: the boundary sits before the last capital
            let prev_offset = chars[i - 1].0;
            i >= 2 && chars[i - 2].1.is_uppercase() && prev_offset > start
        } else {
            false
        };

        if boundary {
            let cut = if ch.is_lowercase() { chars[i - 1].0 } else { offset };
            if cut > start {
                pieces.push(&word[start..cut]);
                start = cut;
            }
        }
    }

    if start < word.len() {
        pieces.push(&word[start..]);
    }
    pieces
}
