//! Format detection for uploaded payloads

use image::{ImageFormat, ImageReader};
use imagems_core::{AppError, ImageType};
use std::io::Cursor;

const BMP_SIGNATURE: [u8; 2] = [0x42, 0x4D];
const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub image_type: ImageType,
    pub width: u32,
    pub height: u32,
}

/// Decode PNG, JPEG or GIF headers for the format and dimensions. Anything
/// else only passes as a bitmap with unknown (zero) dimensions.
pub fn classify(data: &[u8]) -> Result<Classification, AppError> {
    if let Some(decoded) = decode_header(data) {
        return Ok(decoded);
    }

    if data.starts_with(&BMP_SIGNATURE) {
        return Ok(Classification {
            image_type: ImageType::Bmp,
            width: 0,
            height: 0,
        });
    }

    Err(AppError::InvalidInput("unsupported image type".to_string()))
}

fn decode_header(data: &[u8]) -> Option<Classification> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;

    let image_type = match reader.format()? {
        ImageFormat::Png => ImageType::Png,
        ImageFormat::Jpeg => ImageType::Jpeg,
        ImageFormat::Gif => ImageType::Gif,
        _ => return None,
    };

    let (width, height) = reader.into_dimensions().ok()?;
    Some(Classification {
        image_type,
        width,
        height,
    })
}

/// MIME type from the payload's magic bytes. Client-supplied content types are never consulted.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    infer::get(data)
        .map(|kind| kind.mime_type())
        .unwrap_or(UNKNOWN_MIME)
}
