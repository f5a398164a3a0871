//! Compile time constants that are not configurable at runtime.

pub const NAME: &str = "imagems";
pub const VERSION_FULL: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = "Image Micro-Service";

/// Directory below `DATA_DIR` that holds the image tree.
pub const IMAGES_DIR_NAME: &str = "images";

pub const DEFAULT_FOLDER_NAME: &str = "general";

/// `v{major}`, e.g. `v0`.
pub fn version_major_prefixed() -> String {
    let major = VERSION_FULL.split('.').next().unwrap_or("0");
    format!("v{}", major)
}

/// `{name}v{major}`, e.g. `imagemsv0`.
pub fn canonical_name() -> String {
    format!("{}{}", NAME, version_major_prefixed())
}

/// Path prefix every HTTP route is mounted under, e.g. `/v0/imagems`.
pub fn web_root_url() -> String {
    format!("/{}/{}", version_major_prefixed(), NAME)
}
