//! File writer abstraction trait

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory: {0}")]
    CreateDirFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable write of image bytes to a path.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait FileWriter: Send + Sync {
    /// Create `dir` and all missing parents. Creating an existing directory is not an error.
    async fn create_dir_all(&self, dir: &Path) -> StorageResult<()>;

    /// Write `data` to `path`, creating or truncating the file.
    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()>;
}
