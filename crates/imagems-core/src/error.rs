//! Error types module
//!
//! All failures surfaced by the image service are unified under [`AppError`].
//! Every variant belongs to exactly one coarse [`ErrorKind`], which is what the
//! HTTP boundary uses to pick a status code.

/// Coarse error classification used for response-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed, missing or unsupported input. Never retried.
    ClientInput,
    /// Bad, expired or otherwise invalid credentials. Never retried.
    Unauthorized,
    /// Store, filesystem or unexpected failures.
    Internal,
}

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected credentials
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_INPUT")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the client
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Generic message returned to clients for every internal failure.
pub const INTERNAL_CLIENT_MESSAGE: &str = "Something wicked happened, please try again later";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// The single [`ErrorKind`] this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput(_) => ErrorKind::ClientInput,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => ErrorKind::Internal,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::ClientInput
    }

    pub fn is_auth_error(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// Short variant name for structured logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Config(_) => "Config",
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "InternalWithSource",
        }
    }

    /// Full message including the source chain, for server-side logs only.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::ClientInput => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Internal => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Config(_) => "CONFIGURATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::Unauthorized(msg) => msg.clone(),
            _ => INTERNAL_CLIENT_MESSAGE.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        self.is_internal()
    }

    fn log_level(&self) -> LogLevel {
        match self.kind() {
            ErrorKind::ClientInput => LogLevel::Debug,
            ErrorKind::Unauthorized => LogLevel::Warn,
            ErrorKind::Internal => LogLevel::Error,
        }
    }
}
