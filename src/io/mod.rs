//! CLI-facing output handling: exit codes and output formats

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::OutputFormat;
