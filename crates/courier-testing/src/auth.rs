//! Session helpers for integration tests.
//!
//! Protected routes expect `Authorization: Bearer <jwt>`. `MockAuth` mints a real token
//! signed with [`TEST_JWT_SECRET`] so requests pass the same middleware as production.

use axum::http::{HeaderMap, HeaderValue, header};
use courier_auth_types::token::issue_token;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

/// Identity to authenticate test requests as.
pub struct MockAuth {
    pub user_id: Uuid,
    pub email: String,
}

impl MockAuth {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Signed session token for this identity.
    pub fn token(&self) -> String {
        issue_token(self.user_id, &self.email, TEST_JWT_SECRET).expect("HS256 signing never fails")
    }

    /// `Authorization` header value, `Bearer <token>`.
    pub fn bearer(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.token()))
            .expect("JWT is always a valid header value")
    }

    /// Headers as the frontend would send them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, self.bearer());
        map
    }
}
