use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use imagems_core::AppError;
use serde::{Deserialize, Serialize};

use crate::auth::bearer_token;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

const FOLDER_FIELD: &str = "folder";
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// RFC3339 server time of the upload
    pub time: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl UploadResponse {
    fn new(time: DateTime<Utc>, url: String) -> Self {
        Self {
            time: time.to_rfc3339_opts(SecondsFormat::Secs, true),
            url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Base64UploadRequest {
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub image: String,
}

struct UploadForm {
    folder: String,
    image: Vec<u8>,
}

/// Reads the `folder` text field and the single `image` file part.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut folder = String::new();
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FOLDER_FIELD => {
                folder = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read folder field: {}", e))
                })?;
            }
            IMAGE_FIELD => {
                if image.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple image parts are not allowed; send exactly one part named 'image'"
                            .to_string(),
                    ));
                }
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read image data: {}", e))
                })?;
                image = Some(data.to_vec());
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| {
        AppError::InvalidInput("No image provided; expected a part named 'image'".to_string())
    })?;

    Ok(UploadForm { folder, image })
}

/// Upload an image as multipart form data.
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let token = bearer_token(&headers);
    let form = read_upload_form(multipart).await?;

    let (time, result) = state
        .engine
        .new_image(&token, &form.folder, &form.image)
        .await;
    let url = result?;

    Ok((StatusCode::CREATED, Json(UploadResponse::new(time, url))))
}

/// Upload a base64 encoded image in a JSON body.
#[tracing::instrument(skip(state, headers, request), fields(operation = "upload_base64_image"))]
pub async fn upload_base64_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<Base64UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), HttpAppError> {
    let token = bearer_token(&headers);

    let (time, result) = state
        .engine
        .new_base64_image(&token, &request.folder, &request.image)
        .await;
    let url = result?;

    Ok((StatusCode::CREATED, Json(UploadResponse::new(time, url))))
}
