#![allow(async_fn_in_trait)]

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use courier_domain::history::EmailKind;
use courier_domain::pagination::PageRequest;

use crate::domain::types::{
    DeliveryError, EmailHistoryRecord, GmailCredential, GmailGrant, GoogleProfile, HistoryStats,
    OAuthTokens, OutgoingMessage, User,
};
use crate::error::ApiError;

/// Repository for accounts. Soft-deleted rows are invisible to every method.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    /// Insert a new account. Fails with `UserAlreadyExists` on a duplicate email.
    async fn create(&self, user: &User) -> Result<(), ApiError>;
}

/// Repository for linked Gmail tokens (zero or one per user).
pub trait GmailCredentialRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<GmailCredential>, ApiError>;

    /// Update the user's credential if one exists, else insert it.
    async fn upsert(&self, user_id: Uuid, grant: &GmailGrant) -> Result<GmailCredential, ApiError>;

    /// Delete the user's credential. Returns `true` if a row was removed.
    async fn delete_by_user(&self, user_id: Uuid) -> Result<bool, ApiError>;
}

/// Append-only send history.
///
/// `record` is called from spawned bulk workers, so its future must be `Send`.
pub trait EmailHistoryRepository: Send + Sync {
    fn record(
        &self,
        record: &EmailHistoryRecord,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// One page ordered by `sent_at` descending, plus the unpaged total.
    async fn list(
        &self,
        user_id: Uuid,
        kind: Option<EmailKind>,
        page: PageRequest,
    ) -> Result<(Vec<EmailHistoryRecord>, u64), ApiError>;

    /// Counters over all rows, with the 7-day counters bounded by `since`.
    async fn stats(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<HistoryStats, ApiError>;
}

/// Port for Google's OAuth endpoints.
pub trait GoogleOAuthPort: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ApiError>;

    /// Resolve an OAuth access token to the account profile.
    async fn userinfo(&self, access_token: &str) -> Result<GoogleProfile, ApiError>;

    /// Resolve a Google ID token (JWT credential) to the account profile.
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile, ApiError>;
}

/// Port for delivering one message with a user's Gmail access token.
///
/// Called from spawned bulk workers, so its future must be `Send`.
pub trait MailSender: Send + Sync {
    fn send(
        &self,
        access_token: &str,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Port for hashing and verifying account passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, ApiError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, ApiError>;
}
