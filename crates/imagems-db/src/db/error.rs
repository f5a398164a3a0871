use imagems_core::AppError;
use thiserror::Error;

/// Metadata store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("expected {expected} affected row(s) but got {actual}")]
    RowsAffected { expected: u64, actual: u64 },

    #[error("invalid image_meta record: {0}")]
    InvalidRecord(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}
