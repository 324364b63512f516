//! Read-only models shared by every conversion
//!
//! Both models are loaded once and passed by reference (`Arc`) into the
//! converters; nothing mutates them after construction.

pub mod docfreq;
pub mod id;
pub mod vocabulary;

pub use docfreq::FrequencyTable;
pub use id::{ModelId, calculate_hash};
pub use vocabulary::VocabularyIndex;
