use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Detected image format. The lowercase name doubles as the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageType {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageType::Png => "png",
            ImageType::Jpeg => "jpeg",
            ImageType::Gif => "gif",
            ImageType::Bmp => "bmp",
        }
    }

    /// Name of the stored file for the metadata row `id`, e.g. `7.png`.
    pub fn file_name(&self, id: i64) -> String {
        format!("{}.{}", id, self.extension())
    }
}

impl Display for ImageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageType::Png),
            "jpeg" | "jpg" => Ok(ImageType::Jpeg),
            "gif" => Ok(ImageType::Gif),
            "bmp" => Ok(ImageType::Bmp),
            other => Err(format!("unknown image type: {}", other)),
        }
    }
}

/// One record per stored image.
///
/// `id` is assigned by the metadata store on insert and never changes afterwards.
/// `create_date`/`update_date` are stamped by the store; a soft-delete flips
/// `deleted` and refreshes `update_date`, the row itself is never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub id: Option<i64>,
    pub user_id: String,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub mime_type: String,
    /// Zero when the dimensions could not be decoded (bitmap fallback)
    pub width: u32,
    pub height: u32,
    pub create_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
    pub deleted: bool,
}

impl ImageMeta {
    pub fn new(
        user_id: impl Into<String>,
        image_type: ImageType,
        mime_type: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            image_type,
            mime_type: mime_type.into(),
            width,
            height,
            create_date: None,
            update_date: None,
            deleted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_uses_id_and_extension() {
        assert_eq!(ImageType::Png.file_name(7), "7.png");
        assert_eq!(ImageType::Jpeg.file_name(12), "12.jpeg");
    }

    #[test]
    fn test_image_type_parse() {
        assert_eq!("JPEG".parse::<ImageType>(), Ok(ImageType::Jpeg));
        assert_eq!("jpg".parse::<ImageType>(), Ok(ImageType::Jpeg));
        assert_eq!("bmp".parse::<ImageType>(), Ok(ImageType::Bmp));
        assert!("tiff".parse::<ImageType>().is_err());
    }

    #[test]
    fn test_meta_serializes_type_field() {
        let meta = ImageMeta::new("42", ImageType::Gif, "image/gif", 1, 1);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "gif");
        assert_eq!(json["deleted"], false);
    }
}
