//! In-memory FileWriter for tests

use crate::traits::{FileWriter, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Records every directory and file handed to it. Failures can be switched on
/// per operation to exercise rollback paths.
#[derive(Clone, Default)]
pub struct MockFileWriter {
    dirs: Arc<Mutex<HashSet<PathBuf>>>,
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    fail_create_dir: Arc<Mutex<Option<String>>>,
    fail_write: Arc<Mutex<Option<String>>>,
    create_dir_calls: Arc<Mutex<Vec<PathBuf>>>,
    write_calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_dir_all` fail with `message`.
    pub fn fail_create_dir(&self, message: impl Into<String>) {
        *self.fail_create_dir.lock().unwrap() = Some(message.into());
    }

    /// Make every subsequent `write_file` fail with `message`.
    pub fn fail_write(&self, message: impl Into<String>) {
        *self.fail_write.lock().unwrap() = Some(message.into());
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    /// Every path passed to `create_dir_all`, failed attempts included
    pub fn create_dir_calls(&self) -> Vec<PathBuf> {
        self.create_dir_calls.lock().unwrap().clone()
    }

    /// Every path passed to `write_file`, failed attempts included
    pub fn write_calls(&self) -> Vec<PathBuf> {
        self.write_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileWriter for MockFileWriter {
    async fn create_dir_all(&self, dir: &Path) -> StorageResult<()> {
        self.create_dir_calls.lock().unwrap().push(dir.to_path_buf());

        if let Some(msg) = self.fail_create_dir.lock().unwrap().clone() {
            return Err(StorageError::CreateDirFailed(msg));
        }
        self.dirs.lock().unwrap().insert(dir.to_path_buf());
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.write_calls.lock().unwrap().push(path.to_path_buf());

        if let Some(msg) = self.fail_write.lock().unwrap().clone() {
            return Err(StorageError::WriteFailed(msg));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}
