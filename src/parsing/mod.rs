pub mod client;
pub mod detector;
pub mod language;
pub mod tree;

pub use client::{TreeParsingClient, TreeSitterClient};
pub use detector::{ExtensionDetector, LanguageDetector};
pub use language::Language;
pub use tree::{NodeId, NodeRef, NodeRole, ParsedTree, SyntaxNode};
