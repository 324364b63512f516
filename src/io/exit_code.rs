//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success
//! - `1`: General error - unspecified failure
//! - `3`: Empty repository - converted, but nothing to write
//! - `4`: Conversion failure - at least one repository could not be converted
//! - `5`: I/O or persistence failure
//! - `6`: Configuration or model error
//! - `126-255`: Reserved by shell

use crate::batch::BatchStats;
use crate::error::{BatchError, ConversionError, ModelError, PersistenceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Repository produced an empty vector; no output written (code 3)
    EmptyRepository = 3,

    /// Repository could not be converted (code 4)
    ConversionFailed = 4,

    /// File I/O or persistence error (code 5)
    IoError = 5,

    /// Configuration or model error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Map a top-level failure to an exit code by inspecting its cause chain
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if cause.is::<ModelError>() || cause.is::<figment::Error>() {
                return ExitCode::ConfigError;
            }
            if cause.is::<PersistenceError>() || cause.is::<BatchError>() {
                return ExitCode::IoError;
            }
            if cause.is::<ConversionError>() {
                return ExitCode::ConversionFailed;
            }
        }
        ExitCode::GeneralError
    }

    /// Exit code for a finished batch: any failed repository fails the run
    pub fn from_batch(stats: &BatchStats) -> Self {
        if stats.has_failures() {
            ExitCode::ConversionFailed
        } else {
            ExitCode::Success
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::EmptyRepository => "Empty repository",
            ExitCode::ConversionFailed => "Conversion failed",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}
