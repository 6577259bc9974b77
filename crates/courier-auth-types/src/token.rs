//! JWT session tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifetime (24 hours).
pub const SESSION_TTL_HOURS: i64 = 24;

/// Identity carried by a validated session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub email: String,
    pub exp: u64,
}

/// Errors returned by [`issue_token`] and [`validate_token`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user ID (UUID string) |
/// | `email` | custom | account email at issue time |
/// | `exp` | `exp` | expiration, seconds since epoch |
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub exp: u64,
}

// ── Issue ────────────────────────────────────────────────────────────────

/// Sign an HS256 session token valid for [`SESSION_TTL_HOURS`].
pub fn issue_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, AuthError> {
    issue_token_with_ttl(user_id, email, secret, Duration::hours(SESSION_TTL_HOURS))
}

/// Sign an HS256 session token with an explicit lifetime.
pub fn issue_token_with_ttl(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, AuthError> {
    let exp = (Utc::now() + ttl).timestamp().max(0) as u64;
    let claims = JwtClaims {
        sub: user_id.to_string(),
        email: email.to_owned(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

// ── Validate ─────────────────────────────────────────────────────────────

/// Validate a session token and return the identity it carries.
///
/// HS256 only, `exp` and `sub` required, default 60s leeway.
pub fn validate_token(token: &str, secret: &str) -> Result<TokenInfo, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AuthError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        email: data.claims.email,
        exp: data.claims.exp,
    })
}
