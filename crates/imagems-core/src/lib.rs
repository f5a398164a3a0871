//! imagems Core Library
//!
//! Domain models, error types and configuration shared by every imagems crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, IngestSettings};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use models::{ImageMeta, ImageType};
