use async_trait::async_trait;
use imagems_core::AppError;
use thiserror::Error;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential was presented but is not acceptable (expired, forged, malformed).
    #[error("{0}")]
    Invalid(String),

    /// The validator itself failed.
    #[error("token validation failed: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid(msg) => AppError::Unauthorized(msg),
            AuthError::Internal(msg) => {
                AppError::Internal(format!("token validation failed: {}", msg))
            }
        }
    }
}

/// Turns an opaque bearer token into a [`Principal`].
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
