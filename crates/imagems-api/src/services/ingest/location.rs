//! Folder rules and the on-disk/public location of a stored image

use imagems_core::AppError;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

const FOLDER_SEPARATOR: char = '/';

/// Folder syntax check and default-folder substitution.
#[derive(Debug, Clone)]
pub struct FolderRules {
    segment_pattern: Regex,
    default_folder: String,
}

impl FolderRules {
    pub fn new(default_folder: &str) -> Result<Self, AppError> {
        let segment_pattern = Regex::new(r"^[A-Za-z0-9_]*$")
            .map_err(|e| AppError::Config(format!("invalid folder pattern: {}", e)))?;

        if default_folder.is_empty() {
            return Err(AppError::Config(
                "default folder name cannot be empty".to_string(),
            ));
        }

        let rules = Self {
            segment_pattern,
            default_folder: default_folder.to_string(),
        };

        if !rules.is_valid(default_folder) || non_empty_segments(default_folder).is_empty() {
            return Err(AppError::Config(format!(
                "default folder name {:?} must be word characters separated by '/'",
                default_folder
            )));
        }

        Ok(rules)
    }

    fn is_valid(&self, folder: &str) -> bool {
        folder
            .split(FOLDER_SEPARATOR)
            .all(|segment| self.segment_pattern.is_match(segment))
    }

    /// Every `/`-separated segment must consist of ASCII letters, digits or underscores.
    pub fn validate(&self, folder: &str) -> Result<(), AppError> {
        if self.is_valid(folder) {
            Ok(())
        } else {
            Err(AppError::InvalidInput(
                "special characters not allowed in folders".to_string(),
            ))
        }
    }

    /// Path segments for `folder`, falling back to the default folder when it has none.
    pub fn segments<'a>(&'a self, folder: &'a str) -> Vec<&'a str> {
        let requested = non_empty_segments(folder);
        if requested.is_empty() {
            non_empty_segments(&self.default_folder)
        } else {
            requested
        }
    }

    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }
}

fn non_empty_segments(folder: &str) -> Vec<&str> {
    folder
        .split(FOLDER_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parse the public URL root. It must be absolute and able to take path segments.
pub fn parse_url_root(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("invalid image URL root {:?}: {}", raw, e)))?;

    if url.scheme().is_empty() {
        return Err(AppError::Config(format!(
            "image URL root {:?} has no scheme",
            raw
        )));
    }

    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!(
            "image URL root {:?} cannot carry a path",
            raw
        )));
    }

    Ok(url)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    pub path: PathBuf,
    pub url: String,
}

impl ImageLocation {
    /// The same relative segments are appended to the images root and the URL root.
    pub fn new(images_dir: &Path, url_root: &Url, segments: &[&str]) -> Result<Self, AppError> {
        let path = segments
            .iter()
            .fold(images_dir.to_path_buf(), |path, segment| path.join(segment));

        let mut url = url_root.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("image URL root {} cannot carry a path", url_root))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(Self {
            path,
            url: url.to_string(),
        })
    }

    /// Directory the image file lives in.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}
