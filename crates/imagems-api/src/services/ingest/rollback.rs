//! Compensation for a metadata row whose file never made it to disk

use imagems_core::AppError;
use imagems_db::MetadataStore;

/// Soft-delete the row saved as `meta_id` and fold the outcome into one
/// internal error. The original failure is always reported first.
pub async fn undo_saved_meta(
    store: &dyn MetadataStore,
    meta_id: i64,
    cause: AppError,
) -> AppError {
    let cause = cause.detailed_message();

    match store.delete_meta(meta_id).await {
        Ok(()) => {
            tracing::warn!(
                meta_id = meta_id,
                error = %cause,
                "Image metadata rolled back after failed write"
            );
            AppError::Storage(format!("error saving image to file: {}", cause))
        }
        Err(rollback_err) => {
            tracing::error!(
                meta_id = meta_id,
                error = %cause,
                rollback_error = %rollback_err,
                "Image metadata rollback failed, row references a missing file"
            );
            AppError::Storage(format!(
                "error saving image to file: {} ...further while undoing db changes: {}",
                cause, rollback_err
            ))
        }
    }
}
