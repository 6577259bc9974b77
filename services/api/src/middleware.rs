use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use courier_auth_types::identity::{BearerError, Identity, bearer_token};
use courier_auth_types::token::validate_token;

use crate::error::ApiError;

/// HMAC secret handed to [`require_auth`] as middleware state.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Verify `Authorization: Bearer <jwt>` and put the caller's [`Identity`] into request
/// extensions. Rejects with 401 before the handler runs.
pub async fn require_auth(
    State(secret): State<JwtSecret>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).map_err(|e| match e {
        BearerError::Missing => ApiError::Unauthorized,
        BearerError::Malformed => ApiError::InvalidToken,
    })?;
    let info = validate_token(token, &secret.0).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        ApiError::InvalidToken
    })?;

    request.extensions_mut().insert(Identity::from(info));
    Ok(next.run(request).await)
}
