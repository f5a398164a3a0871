use crate::traits::{FileWriter, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Local filesystem file writer
#[derive(Clone, Debug, Default)]
pub struct LocalFileWriter;

impl LocalFileWriter {
    pub fn new() -> Self {
        LocalFileWriter
    }
}

#[async_trait]
impl FileWriter for LocalFileWriter {
    async fn create_dir_all(&self, dir: &Path) -> StorageResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);

        builder.create(dir).await.map_err(|e| {
            StorageError::CreateDirFailed(format!("{}: {}", dir.display(), e))
        })?;

        tracing::debug!(path = %dir.display(), "Image directory ready");
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(FILE_MODE);

        let mut file = options.open(path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image file written"
        );

        Ok(())
    }
}
