//! imagems database layer
//!
//! Persistence of image metadata. Callers depend on [`MetadataStore`];
//! [`ImageMetaRepository`] is the PostgreSQL implementation.

pub mod db;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{ImageMetaRepository, MetadataStore, StoreError};
