//! In-memory MetadataStore for tests

use crate::db::{MetadataStore, StoreError};
use chrono::Utc;
use imagems_core::models::ImageMeta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Keeps records in a map and hands out sequential ids starting at 1.
#[derive(Clone, Default)]
pub struct MockMetadataStore {
    records: Arc<Mutex<HashMap<i64, ImageMeta>>>,
    next_id: Arc<Mutex<i64>>,
    fail_save: Arc<Mutex<Option<String>>>,
    fail_delete: Arc<Mutex<Option<String>>>,
    save_calls: Arc<Mutex<usize>>,
    delete_calls: Arc<Mutex<Vec<i64>>>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_save(&self, message: impl Into<String>) {
        *self.fail_save.lock().unwrap() = Some(message.into());
    }

    pub fn fail_delete(&self, message: impl Into<String>) {
        *self.fail_delete.lock().unwrap() = Some(message.into());
    }

    pub fn record(&self, id: i64) -> Option<ImageMeta> {
        self.records.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `save_meta` attempts, failed ones included
    pub fn save_calls(&self) -> usize {
        *self.save_calls.lock().unwrap()
    }

    /// Ids passed to `delete_meta`, in call order
    pub fn delete_calls(&self) -> Vec<i64> {
        self.delete_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MetadataStore for MockMetadataStore {
    async fn save_meta(&self, meta: &ImageMeta) -> Result<i64, StoreError> {
        *self.save_calls.lock().unwrap() += 1;

        if let Some(msg) = self.fail_save.lock().unwrap().clone() {
            return Err(StoreError::InvalidRecord(msg));
        }

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };

        let now = Utc::now();
        let mut stored = meta.clone();
        stored.id = Some(id);
        stored.create_date = Some(now);
        stored.update_date = Some(now);
        stored.deleted = false;
        self.records.lock().unwrap().insert(id, stored);

        Ok(id)
    }

    async fn delete_meta(&self, id: i64) -> Result<(), StoreError> {
        self.delete_calls.lock().unwrap().push(id);

        if let Some(msg) = self.fail_delete.lock().unwrap().clone() {
            return Err(StoreError::InvalidRecord(msg));
        }

        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) => {
                record.deleted = true;
                record.update_date = Some(Utc::now());
                Ok(())
            }
            None => Err(StoreError::RowsAffected {
                expected: 1,
                actual: 0,
            }),
        }
    }

    async fn get_meta(&self, id: i64) -> Result<Option<ImageMeta>, StoreError> {
        Ok(self.record(id))
    }
}
