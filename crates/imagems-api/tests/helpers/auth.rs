use chrono::{Duration, Utc};
use imagems_api::auth::JwtClaims;
use jsonwebtoken::{encode, EncodingKey, Header};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_MASTER_API_KEY: &str = "test-master-api-key";
pub const TEST_USER_ID: &str = "42";

fn sign(claims: &JwtClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

fn claims(user_id: &str, exp: i64) -> JwtClaims {
    JwtClaims {
        usr_id: Some(user_id.to_string()),
        sub: None,
        exp,
        iat: Some(Utc::now().timestamp()),
        nbf: None,
    }
}

/// Valid for an hour, signed with the test secret.
pub fn token_for(user_id: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    sign(&claims(user_id, exp), TEST_JWT_SECRET)
}

pub fn expired_token_for(user_id: &str) -> String {
    let exp = (Utc::now() - Duration::hours(1)).timestamp();
    sign(&claims(user_id, exp), TEST_JWT_SECRET)
}

pub fn foreign_token_for(user_id: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    sign(&claims(user_id, exp), "some-other-secret")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
