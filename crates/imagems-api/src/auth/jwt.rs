//! HS256 JWT validation

use crate::auth::validator::{AuthError, Principal, TokenValidator};
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims structure. `usr_id` is preferred, `sub` is accepted as a fallback.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl JwtClaims {
    fn user_id(&self) -> Option<&str> {
        self.usr_id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Validates tokens signed with a shared HS256 secret.
#[derive(Clone)]
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Invalid("Missing bearer token".to_string()));
        }

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AuthError::Invalid("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AuthError::Invalid("Token is not yet valid (nbf)".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::Invalid("Invalid token signature".to_string())
                    }
                    _ => AuthError::Invalid(format!("Invalid or expired token: {}", e)),
                }
            })?;

        let user_id = token_data
            .claims
            .user_id()
            .ok_or_else(|| AuthError::Invalid("Token carries no user id".to_string()))?;

        Ok(Principal::new(user_id))
    }
}
