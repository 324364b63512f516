//! Language detection for repository files
//!
//! The converter only needs a label per file: anything it cannot map to a
//! supported and enabled language is skipped without being parsed.

use super::Language;
use crate::Settings;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

/// Number of leading bytes inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Decides which language a file is written in
pub trait LanguageDetector: Send + Sync {
    /// Return the file's language, or `None` when it is unknown or unsupported
    fn detect(&self, path: &Path, content: &[u8]) -> Option<Language>;
}

/// Extension-based detector honouring the `[languages.*]` settings
#[derive(Debug, Clone)]
pub struct ExtensionDetector {
    extensions: HashMap<String, Language>,
}

impl ExtensionDetector {
    /// Build a detector from the enabled languages in `settings`
    ///
    /// Languages are visited in [`Language::all`] order. When two enabled
    /// languages claim the same extension, the earlier one keeps it.
    pub fn new(settings: &Settings) -> Self {
        let mut extensions: HashMap<String, Language> = HashMap::new();

        let mut unknown: Vec<&String> = settings
            .languages
            .keys()
            .filter(|key| Language::from_config_key(key).is_none())
            .collect();
        unknown.sort();
        for key in unknown {
            tracing::warn!(language = %key, "ignoring unknown language in settings");
        }

        for &language in Language::all() {
            let Some(config) = settings.languages.get(language.config_key()) else {
                continue;
            };
            if !config.enabled {
                continue;
            }
            for ext in &config.extensions {
                match extensions.entry(ext.to_lowercase()) {
                    Entry::Vacant(slot) => {
                        slot.insert(language);
                    }
                    Entry::Occupied(slot) if *slot.get() != language => {
                        tracing::warn!(
                            extension = %slot.key(),
                            kept = %slot.get(),
                            ignored = %language,
                            "extension claimed by two languages"
                        );
                    }
                    Entry::Occupied(_) => {}
                }
            }
        }

        Self { extensions }
    }
}

impl Default for ExtensionDetector {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl LanguageDetector for ExtensionDetector {
    fn detect(&self, path: &Path, content: &[u8]) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let language = self.extensions.get(&ext).copied()?;

        if looks_binary(content) {
            return None;
        }
        Some(language)
    }
}

/// Heuristic used by git: a NUL byte near the start means binary
fn looks_binary(content: &[u8]) -> bool {
    content[..content.len().min(BINARY_SNIFF_LEN)].contains(&0)
}
