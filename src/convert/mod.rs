//! Per-repository conversion: enumeration, parallel extraction, weighting

pub mod converter;
pub mod stats;
pub mod walker;

pub use converter::RepoConverter;
pub use stats::{ConversionStats, FileOutcome};
pub use walker::FileWalker;
