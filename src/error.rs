//! Error types for the repository conversion pipeline
//!
//! This module provides structured error types using thiserror. Errors are
//! grouped by the layer that raises them: per-file parsing, per-repository
//! conversion, model loading and output persistence.

use crate::parsing::Language;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while converting a single repository.
///
/// Only failures that prevent the repository from being enumerated at all
/// end up here. Individual file failures are absorbed by the converter.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to enumerate repository '{path}': {source}")]
    Enumeration {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Repository root '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Failed to clone '{url}': {reason}")]
    Clone { url: String, reason: String },

    #[error("Conversion task was cancelled before it finished")]
    Cancelled,
}

impl ConversionError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Enumeration { .. } => "ENUMERATION_ERROR",
            Self::NotADirectory { .. } => "NOT_A_DIRECTORY",
            Self::Clone { .. } => "CLONE_ERROR",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Enumeration { .. } | Self::NotADirectory { .. } => vec![
                "Check that the repository path exists and is readable",
                "Pass the repository root directory, not a file inside it",
            ],
            Self::Clone { .. } => vec![
                "Check the repository URL and your network connection",
                "Set GIT_USERNAME and GIT_PASSWORD for private HTTPS remotes",
            ],
            Self::Cancelled => vec![],
        }
    }
}

/// Errors raised for a single file by the tree parsing client.
///
/// These never leave the repository converter: a failed file simply
/// contributes no tokens.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse {language} source: {reason}")]
    Failure { language: Language, reason: String },

    #[error("Parsing {language} source exceeded {timeout:?}")]
    Timeout {
        language: Language,
        timeout: Duration,
    },

    #[error("No parser available for language '{label}'")]
    UnsupportedLanguage { label: String },

    #[error("Invalid UTF-8 in source file")]
    InvalidUtf8,
}

impl ParseError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors raised while loading the vocabulary or document frequency models
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model '{source_path}': {cause}")]
    Read {
        source_path: String,
        cause: std::io::Error,
    },

    #[error("Model '{source_path}' is not in a recognised format: {reason}")]
    Format { source_path: String, reason: String },

    #[error("Model '{source_path}' is invalid: {reason}")]
    Invalid { source_path: String, reason: String },

    #[error("No {model} model configured")]
    Missing { model: &'static str },
}

impl ModelError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "MODEL_READ_ERROR",
            Self::Format { .. } => "MODEL_FORMAT_ERROR",
            Self::Invalid { .. } => "MODEL_INVALID",
            Self::Missing { .. } => "MODEL_MISSING",
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Missing { .. } => vec![
                "Set models.vocabulary and models.docfreq in .repo2nbow/settings.toml",
                "Or pass --vocabulary and --docfreq on the command line",
            ],
            Self::Read { .. } => vec!["Check that the model path exists and is readable"],
            Self::Format { .. } | Self::Invalid { .. } => vec![
                "Vocabularies are JSON {\"tokens\": [...]} or one token per line",
                "Document frequencies are JSON {\"docs\": N, \"df\": {...}}",
            ],
        }
    }
}

/// Errors raised while writing or reading a persisted nBOW document
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize document for '{path}': {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to upload '{key}' to {bucket}: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },
}

impl PersistenceError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Write { .. } => "WRITE_ERROR",
            Self::Read { .. } => "READ_ERROR",
            Self::Serialize { .. } => "SERIALIZE_ERROR",
            Self::Upload { .. } => "UPLOAD_ERROR",
        }
    }
}

/// Errors that abort a batch before any repository is processed
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read repository list '{path}': {source}")]
    InputList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to prepare output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for repository conversion
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for model loading
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type alias for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;
