//! Identifier tokens: splitting, extraction and counting

pub mod counts;
pub mod extractor;
pub mod split;

pub use counts::TokenCounts;
pub use extractor::TokenExtractor;
pub use split::{IdentifierSplitter, SplitPolicy};
