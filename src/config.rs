//! Configuration module for the repository conversion pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `NBOW_` and use double underscores
//! to separate nested levels:
//! - `NBOW_CONVERSION__FILE_THREADS=8` sets `conversion.file_threads`
//! - `NBOW_CONVERSION__FILE_TIMEOUT_MS=2000` sets `conversion.file_timeout_ms`
//! - `NBOW_MODELS__VOCABULARY=/models/vocab.json` sets `models.vocabulary`

use crate::parsing::Language;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-workspace configuration directory
pub const CONFIG_DIR: &str = ".repo2nbow";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "NBOW_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .repo2nbow is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Model sources
    #[serde(default)]
    pub models: ModelsConfig,

    /// Per-repository conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Identifier splitting policy
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Batch driver settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Output upload settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Language-specific settings
    #[serde(default = "default_languages")]
    pub languages: HashMap<String, LanguageConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ModelsConfig {
    /// Vocabulary (token to index) model location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<String>,

    /// Document frequency model location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docfreq: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionConfig {
    /// Number of files parsed concurrently within one repository
    #[serde(default = "default_file_threads")]
    pub file_threads: usize,

    /// Hard timeout for parsing one file, in milliseconds
    #[serde(default = "default_file_timeout_ms")]
    pub file_timeout_ms: u64,

    /// Optional time budget for a whole repository, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_timeout_secs: Option<u64>,

    /// Files larger than this many bytes are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Directory names that are never entered
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Additional gitignore-style patterns to exclude
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Respect .gitignore files found in the repository
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Document frequency floor used for tokens missing from the table
    #[serde(default = "default_min_docfreq")]
    pub min_docfreq: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    /// Regular expression matching the separators between identifier parts
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Sub-tokens shorter than this are discarded
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Split camelCase and PascalCase parts
    #[serde(default = "default_true")]
    pub split_camel_case: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BatchConfig {
    /// Number of repositories converted concurrently
    #[serde(default = "default_repository_threads")]
    pub repository_threads: usize,

    /// Regenerate outputs that already exist
    #[serde(default = "default_false")]
    pub overwrite: bool,

    /// Treat each subdirectory of an input directory as a repository
    #[serde(default = "default_false")]
    pub nested: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// Bucket that receives a copy of every written result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    /// Whether this language is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// File extensions for this language
    #[serde(default)]
    pub extensions: Vec<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_file_threads() -> usize {
    num_cpus::get()
}
fn default_file_timeout_ms() -> u64 {
    10_000
}
fn default_max_file_size() -> u64 {
    512 * 1024
}
fn default_ignored_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        ".hg".to_string(),
        ".svn".to_string(),
        ".bzr".to_string(),
    ]
}
fn default_min_docfreq() -> u64 {
    1
}
fn default_delimiter() -> String {
    "[^A-Za-z0-9]+".to_string()
}
fn default_min_length() -> usize {
    2
}
fn default_repository_threads() -> usize {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            models: ModelsConfig::default(),
            conversion: ConversionConfig::default(),
            tokens: TokenConfig::default(),
            batch: BatchConfig::default(),
            storage: StorageConfig::default(),
            languages: default_languages(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            file_threads: default_file_threads(),
            file_timeout_ms: default_file_timeout_ms(),
            repository_timeout_secs: None,
            max_file_size: default_max_file_size(),
            ignored_dirs: default_ignored_dirs(),
            ignore_patterns: Vec::new(),
            respect_gitignore: true,
            min_docfreq: default_min_docfreq(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            min_length: default_min_length(),
            split_camel_case: true,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            repository_threads: default_repository_threads(),
            overwrite: false,
            nested: false,
        }
    }
}

impl ConversionConfig {
    pub fn file_timeout(&self) -> Duration {
        Duration::from_millis(self.file_timeout_ms)
    }

    pub fn repository_timeout(&self) -> Option<Duration> {
        self.repository_timeout_secs.map(Duration::from_secs)
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    Language::all()
        .iter()
        .map(|language| {
            (
                language.config_key().to_string(),
                LanguageConfig {
                    enabled: true,
                    extensions: language
                        .extensions()
                        .iter()
                        .map(|ext| ext.to_string())
                        .collect(),
                },
            )
        })
        .collect()
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscores stay
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for the config directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .repo2nbow is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# repo2nbow configuration file

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[models]
# Vocabulary model: JSON {{"tokens": [...]}} or one token per line
# vocabulary = "models/vocabulary.json"

# Document frequency model: JSON {{"docs": N, "df": {{"token": count}}}}
# docfreq = "models/docfreq.json"

[conversion]
# Files parsed concurrently within one repository (defaults to CPU count)
# file_threads = {threads}

# Hard timeout for parsing a single file
file_timeout_ms = 10000

# Optional budget for a whole repository; unfinished files are abandoned
# repository_timeout_secs = 600

# Files larger than this are skipped (bytes)
max_file_size = 524288

# Directory names that are never entered
ignored_dirs = [".git", ".hg", ".svn", ".bzr"]

# Additional gitignore-style exclusions
ignore_patterns = []

respect_gitignore = true

# Document frequency used for tokens the table does not know
min_docfreq = 1

[tokens]
# Separator between identifier parts
delimiter = "[^A-Za-z0-9]+"

# Shorter sub-tokens are dropped
min_length = 2

split_camel_case = true

[batch]
# Repositories converted concurrently
repository_threads = 2

# Regenerate results that already exist
overwrite = false

# Treat every subdirectory of an input directory as a repository
nested = false

[storage]
# Upload results to a bucket as well
# bucket = "file:///mnt/results"
"#,
            threads = num_cpus::get()
        );

        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
