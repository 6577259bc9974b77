//! Authenticated-user extractor and bearer-header parsing.

use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderMap, StatusCode, header};
use uuid::Uuid;

use crate::token::TokenInfo;

/// Authenticated user, placed in request extensions by the auth middleware.
///
/// Extracting it in a handler that is not behind the middleware yields 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<TokenInfo> for Identity {
    fn from(info: TokenInfo) -> Self {
        Self {
            user_id: info.user_id,
            email: info.email,
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<Identity>().cloned();
        async move { identity.ok_or(StatusCode::UNAUTHORIZED) }
    }
}

/// Why a request carried no usable bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerError {
    /// No `Authorization` header at all.
    Missing,
    /// Header present but not `Bearer <token>`.
    Malformed,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme match is case-insensitive; an empty token is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?
        .to_str()
        .map_err(|_| BearerError::Malformed)?;
    let (scheme, token) = raw.split_once(' ').ok_or(BearerError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerError::Malformed);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(BearerError::Malformed);
    }
    Ok(token)
}
