pub mod status;
pub mod upload;

use axum::http::StatusCode;

/// Fallback for every path that is neither a route nor a stored image.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Nothing to see here")
}
