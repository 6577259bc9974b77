use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GoogleOAuthConfig;
use crate::domain::repository::{GoogleOAuthPort, MailSender};
use crate::domain::types::{DeliveryError, GoogleProfile, OAuthTokens, OutgoingMessage};
use crate::error::ApiError;

/// Shared HTTP client for Google APIs.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .context("build http client")
}

/// Google REST endpoints. Overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub token: String,
    pub userinfo: String,
    pub tokeninfo: String,
    pub gmail_send: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            token: "https://oauth2.googleapis.com/token".to_owned(),
            userinfo: "https://www.googleapis.com/oauth2/v2/userinfo".to_owned(),
            tokeninfo: "https://oauth2.googleapis.com/tokeninfo".to_owned(),
            gmail_send: "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
                .to_owned(),
        }
    }
}

// ── OAuth ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GoogleOAuthClient {
    pub http: reqwest::Client,
    pub config: Arc<GoogleOAuthConfig>,
    pub endpoints: Arc<GoogleEndpoints>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
}

impl GoogleOAuthPort for GoogleOAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ApiError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self
            .http
            .post(&self.endpoints.token)
            .form(&params)
            .send()
            .await
            .context("send token request")
            .map_err(ApiError::Upstream)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(anyhow!(
                "token request failed with status {status}: {body}"
            )));
        }

        let tokens: TokenResponse = resp
            .json()
            .await
            .context("decode token response")
            .map_err(ApiError::Upstream)?;
        Ok(OAuthTokens {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: if tokens.token_type.is_empty() {
                "Bearer".to_owned()
            } else {
                tokens.token_type
            },
            expires_in: tokens.expires_in,
        })
    }

    async fn userinfo(&self, access_token: &str) -> Result<GoogleProfile, ApiError> {
        let resp = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await
            .context("send userinfo request")
            .map_err(ApiError::Upstream)?;
        profile_from(resp).await
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile, ApiError> {
        let resp = self
            .http
            .get(&self.endpoints.tokeninfo)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .context("send tokeninfo request")
            .map_err(ApiError::Upstream)?;
        profile_from(resp).await
    }
}

/// Map a userinfo/tokeninfo response to a profile. Google rejects bad tokens with 400/401.
async fn profile_from(resp: reqwest::Response) -> Result<GoogleProfile, ApiError> {
    match resp.status() {
        s if s.is_success() => {}
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(ApiError::InvalidGoogleToken);
        }
        s => {
            return Err(ApiError::Upstream(anyhow!(
                "google profile request failed with status {s}"
            )));
        }
    }
    let profile: ProfileResponse = resp
        .json()
        .await
        .context("decode google profile")
        .map_err(ApiError::Upstream)?;
    if profile.email.is_empty() {
        return Err(ApiError::InvalidGoogleToken);
    }
    Ok(GoogleProfile {
        email: profile.email,
        name: profile.name,
    })
}

// ── Gmail ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GmailSender {
    pub http: reqwest::Client,
    pub endpoints: Arc<GoogleEndpoints>,
}

/// base64url (padded) encoding of the RFC 822 message, as the `raw` field expects.
pub fn encode_raw(message: &OutgoingMessage) -> String {
    URL_SAFE.encode(message.to_rfc822().as_bytes())
}

impl MailSender for GmailSender {
    async fn send(
        &self,
        access_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({ "raw": encode_raw(message) });
        let resp = self
            .http
            .post(&self.endpoints.gmail_send)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DeliveryError(format!(
            "gmail returned {status}: {}",
            body.trim()
        )))
    }
}
