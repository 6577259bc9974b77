use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::GoogleOAuthConfig;
use crate::infra::db::{DbEmailHistoryRepository, DbGmailCredentialRepository, DbUserRepository};
use crate::infra::google::{GmailSender, GoogleEndpoints, GoogleOAuthClient};
use crate::infra::password::Argon2PasswordHasher;
use crate::middleware::JwtSecret;
use crate::usecase::bulk::BulkSettings;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub http: reqwest::Client,
    pub google: Arc<GoogleOAuthConfig>,
    pub endpoints: Arc<GoogleEndpoints>,
    pub jwt_secret: String,
    pub hasher: Argon2PasswordHasher,
    pub bulk: BulkSettings,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn gmail_credential_repo(&self) -> DbGmailCredentialRepository {
        DbGmailCredentialRepository {
            db: self.db.clone(),
        }
    }

    pub fn history_repo(&self) -> DbEmailHistoryRepository {
        DbEmailHistoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn google_oauth(&self) -> GoogleOAuthClient {
        GoogleOAuthClient {
            http: self.http.clone(),
            config: Arc::clone(&self.google),
            endpoints: Arc::clone(&self.endpoints),
        }
    }

    pub fn mail_sender(&self) -> GmailSender {
        GmailSender {
            http: self.http.clone(),
            endpoints: Arc::clone(&self.endpoints),
        }
    }

    pub fn password_hasher(&self) -> Argon2PasswordHasher {
        self.hasher.clone()
    }

    /// Middleware state for [`crate::middleware::require_auth`].
    pub fn auth_secret(&self) -> JwtSecret {
        JwtSecret::new(self.jwt_secret.as_str())
    }
}
