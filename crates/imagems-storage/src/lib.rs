//! imagems Storage Library
//!
//! Durable byte-level writes of image content. The ingestion engine only talks
//! to the [`FileWriter`] trait; [`LocalFileWriter`] is the filesystem backend.
//!
//! # Layout
//!
//! Images live under the configured images root as `{user_id}/{folder}/{meta_id}.{ext}`.
//! Path construction is the caller's job; this crate writes whatever absolute
//! path it is handed.

pub mod local;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use local::LocalFileWriter;
pub use traits::{FileWriter, StorageError, StorageResult};
