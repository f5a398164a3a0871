//! Caller authentication: bearer-token validation and the API-key gate.

pub mod jwt;
pub mod middleware;
pub mod validator;

pub use jwt::{JwtClaims, JwtTokenValidator};
pub use middleware::{api_key_middleware, bearer_token, ApiKeyState};
pub use validator::{AuthError, Principal, TokenValidator};
