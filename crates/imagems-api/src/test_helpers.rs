//! Test doubles for the auth boundary and engine settings

use crate::auth::{AuthError, Principal, TokenValidator};
use async_trait::async_trait;
use imagems_core::IngestSettings;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Accepts a fixed set of tokens. Anything else is rejected as invalid.
#[derive(Clone, Default)]
pub struct StaticTokenValidator {
    tokens: Arc<Mutex<HashMap<String, String>>>,
    internal_failure: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.into(), user_id.into());
        self
    }

    /// Every validation fails with [`AuthError::Internal`].
    pub fn fail_internally(&self, message: impl Into<String>) {
        *self.internal_failure.lock().unwrap() = Some(message.into());
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        *self.calls.lock().unwrap() += 1;

        if let Some(msg) = self.internal_failure.lock().unwrap().clone() {
            return Err(AuthError::Internal(msg));
        }

        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .map(Principal::new)
            .ok_or_else(|| AuthError::Invalid("Invalid or expired token".to_string()))
    }
}

/// Plain [`IngestSettings`] for building an engine without a full `Config`.
#[derive(Clone, Debug)]
pub struct StaticIngestSettings {
    pub images_dir: PathBuf,
    pub img_url_root: String,
    pub default_folder_name: String,
}

impl StaticIngestSettings {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            img_url_root: "http://localhost:8080/v0/imagems".to_string(),
            default_folder_name: "general".to_string(),
        }
    }
}

impl IngestSettings for StaticIngestSettings {
    fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    fn img_url_root(&self) -> &str {
        &self.img_url_root
    }

    fn default_folder_name(&self) -> &str {
        &self.default_folder_name
    }
}

/// Encoded fixture images.
pub mod fixtures {
    use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgba8(RgbaImage::new(width, height)),
            ImageFormat::Png,
        )
    }

    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgb8(RgbImage::new(width, height)),
            ImageFormat::Jpeg,
        )
    }

    pub fn gif(width: u32, height: u32) -> Vec<u8> {
        encode(
            DynamicImage::ImageRgba8(RgbaImage::new(width, height)),
            ImageFormat::Gif,
        )
    }
}
