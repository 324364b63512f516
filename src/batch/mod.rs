//! Batch driver: many repositories in, one result file per repository out

pub mod source;
pub mod stats;
pub mod transformer;

pub use source::{Checkout, RepositoryLocation, expand_inputs};
pub use stats::{BatchStats, RepositoryOutcome, RepositoryReport};
pub use transformer::BatchTransformer;
