use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use imagems_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "x-api-key";
const BEARER_PREFIX: &str = "bearer ";

#[derive(Clone)]
pub struct ApiKeyState {
    pub master_api_key: String,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Rejects requests whose `x-api-key` header does not match the configured key.
pub async fn api_key_middleware(
    State(state): State<Arc<ApiKeyState>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if !secure_compare(presented, &state.master_api_key) {
        return HttpAppError(AppError::Unauthorized("Invalid API key".to_string()))
            .into_response();
    }

    next.run(request).await
}

/// Token from the first `Authorization` header carrying a case-insensitive
/// `Bearer ` prefix. Empty when there is none; the validator rejects that.
pub fn bearer_token(headers: &HeaderMap) -> String {
    headers
        .get_all(axum::http::header::AUTHORIZATION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.len() > BEARER_PREFIX.len())
        .find(|value| {
            value
                .get(..BEARER_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX))
        })
        .map(|value| value[BEARER_PREFIX.len()..].to_string())
        .unwrap_or_default()
}
