//! SDK credential signing.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::meeting::{SessionError, SessionResult};

/// Claims the platform expects in an SDK authentication token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkClaims {
    #[serde(rename = "appKey")]
    pub app_key: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "tokenExp")]
    pub token_exp: i64,
}

impl SdkClaims {
    pub fn new(app_key: impl Into<String>, ttl: Duration) -> Self {
        let iat = Utc::now();
        let exp = iat + ttl;
        Self {
            app_key: app_key.into(),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
            token_exp: exp.timestamp(),
        }
    }
}

/// Signs an HS256 token for `key` with `secret`.
pub fn sign_sdk_token(key: &str, secret: &str, ttl: Duration) -> SessionResult<String> {
    let claims = SdkClaims::new(key, ttl);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| SessionError::InternalError(format!("failed to sign SDK token: {}", e)))
}
