//! Terminal display: progress bars and summary tables.

pub mod progress;
pub mod tables;

pub use progress::{create_batch_progress, create_spinner, with_spinner};
pub use tables::{TableBuilder, create_batch_table, create_document_table};
