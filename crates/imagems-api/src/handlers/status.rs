use axum::Json;
use imagems_core::constants;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub canonical_name: String,
}

/// Service identity.
pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        name: constants::NAME,
        version: constants::VERSION_FULL,
        description: constants::DESCRIPTION,
        canonical_name: constants::canonical_name(),
    })
}
