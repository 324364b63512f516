//! Convert source code repositories into normalized bag-of-words vectors.
//!
//! Files are parsed, their identifiers split into sub-tokens, the counts
//! weighted by tf-idf against a document frequency table and projected onto
//! a fixed vocabulary. The result is one sparse, unit-length vector per
//! repository.

pub mod batch;
pub mod config;
pub mod convert;
pub mod display;
pub mod error;
pub mod io;
pub mod logging;
pub mod models;
pub mod nbow;
pub mod parsing;
pub mod storage;
pub mod tokens;

pub use batch::{BatchStats, BatchTransformer, RepositoryLocation, expand_inputs};
pub use config::Settings;
pub use convert::{ConversionStats, FileWalker, RepoConverter};
pub use error::{
    BatchError, ConversionError, ConversionResult, ModelError, ModelResult, ParseError,
    ParseResult, PersistenceError, PersistenceResult,
};
pub use models::{FrequencyTable, ModelId, VocabularyIndex};
pub use nbow::{NbowDocument, NbowMeta, SparseVector, TokenWeights, Weighter};
pub use parsing::{
    ExtensionDetector, Language, LanguageDetector, ParsedTree, SyntaxNode, TreeParsingClient,
    TreeSitterClient,
};
pub use storage::{LocalBucket, ObjectStore};
pub use tokens::{IdentifierSplitter, SplitPolicy, TokenCounts, TokenExtractor};
