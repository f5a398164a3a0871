//! Database repositories
//
// Store errors
pub mod error;
//
// Image metadata repository and the store abstraction it implements
pub mod image_meta;

pub use error::StoreError;
pub use image_meta::{ImageMetaRepository, MetadataStore};
