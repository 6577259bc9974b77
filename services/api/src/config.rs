use anyhow::Context as _;
use url::Url;

use courier_core::config::{load_dotenv, optional, or_default, parsed_or, required};

/// Google's OAuth 2.0 authorization endpoint.
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";

/// Scope required to send mail on the user's behalf.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// Redirect URI used by popup-based Google sign-in when none is configured.
pub const DEFAULT_REDIRECT_URL: &str = "postmessage";

/// API service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// HMAC secret for signing session tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    pub google: GoogleOAuthConfig,
    /// Extra CORS origin for a deployed frontend. Env var: `FRONTEND_URL`.
    pub frontend_url: Option<String>,
    /// TCP port to listen on (default 8080). Env var: `PORT`.
    pub port: u16,
}

/// Google OAuth client registration. Immutable after startup.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl ApiConfig {
    /// Load `.env` (when present) and then read the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        load_dotenv();

        let google = GoogleOAuthConfig {
            client_id: or_default("GOOGLE_CLIENT_ID", ""),
            client_secret: or_default("GOOGLE_CLIENT_SECRET", ""),
            redirect_url: or_default("GOOGLE_REDIRECT_URL", DEFAULT_REDIRECT_URL),
        };
        if google.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set; Google sign-in and Gmail linking will fail");
        }
        if google.client_secret.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_SECRET is not set; Google code exchange will fail");
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            google,
            frontend_url: optional("FRONTEND_URL"),
            port: parsed_or("PORT", 8080)?,
        })
    }
}

impl GoogleOAuthConfig {
    /// Consent-screen URL asking for offline Gmail send access.
    pub fn authorization_url(&self, state: &str) -> anyhow::Result<Url> {
        Url::parse_with_params(
            GOOGLE_AUTH_ENDPOINT,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", GMAIL_SEND_SCOPE),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .context("build google authorization url")
    }
}
