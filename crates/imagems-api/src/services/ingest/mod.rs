//! Image ingestion: validation, classification, persistence and rollback.

mod classify;
mod engine;
mod location;
mod rollback;

pub use classify::{classify, sniff_mime, Classification};
pub use engine::{IngestResult, IngestionEngine};
pub use location::{FolderRules, ImageLocation};
