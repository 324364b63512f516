//! Weighting, the sparse nBOW vector and its persisted form

pub mod document;
pub mod vector;
pub mod weighter;

pub use document::{NbowDocument, NbowMeta};
pub use vector::SparseVector;
pub use weighter::{TokenWeights, Weighter};
