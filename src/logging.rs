//! Logging setup for the command line
//!
//! Library code only emits `tracing` events; the binary installs a single
//! fmt subscriber writing to stderr so stdout stays free for results.

use tracing_subscriber::EnvFilter;

/// Verbosity requested on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Self::Verbose,
            (false, true) => Self::Quiet,
            _ => Self::Normal,
        }
    }
}

/// Filter directives for the given flags
///
/// Precedence: `--verbose`, `--quiet`, settings `debug`, then `RUST_LOG`,
/// falling back to `info` for this crate.
pub fn build_filter(verbosity: Verbosity, debug: bool) -> EnvFilter {
    match verbosity {
        Verbosity::Verbose => EnvFilter::new("repo2nbow=debug"),
        Verbosity::Quiet => EnvFilter::new("repo2nbow=warn"),
        Verbosity::Normal if debug => EnvFilter::new("repo2nbow=debug"),
        Verbosity::Normal => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repo2nbow=info"))
        }
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbosity: Verbosity, debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity, debug))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
