//! Configuration module
//!
//! Service configuration is read from the environment (with `.env` support via
//! dotenvy) and validated once at startup.

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{self, DEFAULT_FOLDER_NAME, IMAGES_DIR_NAME};

const SERVER_PORT: u16 = 8080;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 32;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const DATA_DIR: &str = "./data";

/// Settings the ingestion engine consumes. The engine validates these itself
/// before accepting traffic.
pub trait IngestSettings: Send + Sync {
    /// Filesystem root of the image tree
    fn images_dir(&self) -> &Path;

    /// Absolute URL the image tree is served from
    fn img_url_root(&self) -> &str;

    /// Folder used when the caller supplies none
    fn default_folder_name(&self) -> &str;
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    /// When set, every API route requires a matching `x-api-key` header
    pub master_api_key: Option<String>,
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub img_url_root: String,
    pub default_folder_name: String,
    pub max_upload_size_bytes: usize,
    /// Requests handled at once before new ones wait
    pub http_concurrency_limit: usize,
    /// `LOG_FORMAT=json` switches console logs to JSON lines
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| DATA_DIR.to_string()));
        let images_dir = data_dir.join(IMAGES_DIR_NAME);

        let img_url = var("IMG_URL").unwrap_or_else(|| format!("http://localhost:{}", server_port));
        let img_url_root = format!(
            "{}{}",
            img_url.trim().trim_end_matches('/'),
            constants::web_root_url()
        );

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        Ok(Config {
            server_port,
            environment,
            cors_origins,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            master_api_key: var("MASTER_API_KEY"),
            data_dir,
            images_dir,
            img_url_root,
            default_folder_name: var("DEFAULT_FOLDER_NAME")
                .unwrap_or_else(|| DEFAULT_FOLDER_NAME.to_string()),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            log_json: var("LOG_FORMAT")
                .map(|format| format.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        if self.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Database timeout cannot be 0"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max upload size cannot be 0"));
        }

        if self.default_folder_name.is_empty() {
            return Err(anyhow::anyhow!("DEFAULT_FOLDER_NAME cannot be empty"));
        }

        Ok(())
    }
}

impl IngestSettings for Config {
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
