use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use courier_core::serde::to_rfc3339_ms;
use courier_domain::history::{EmailKind, EmailStatus};

/// Account record. `password_hash` is empty for accounts created through Google.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh account with a UUIDv7 id. Pass an empty hash for OAuth-only accounts.
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email,
            name,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password_hash.is_empty()
    }
}

/// Stored Gmail OAuth tokens for one user.
#[derive(Debug, Clone)]
pub struct GmailCredential {
    pub id: Uuid,
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Token fields written by a credential upsert.
#[derive(Debug, Clone)]
pub struct GmailGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

/// One send attempt.
#[derive(Debug, Clone)]
pub struct EmailHistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EmailKind,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    pub error_message: String,
    /// Empty for single sends.
    pub batch_id: String,
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EmailHistoryRecord {
    pub fn attempt(user_id: Uuid, kind: EmailKind, outcome: &DeliveryOutcome) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind,
            recipient_email: outcome.recipient_email.clone(),
            recipient_name: outcome.recipient_name.clone(),
            subject: outcome.subject.clone(),
            body: outcome.body.clone(),
            status: if outcome.error.is_none() {
                EmailStatus::Sent
            } else {
                EmailStatus::Failed
            },
            error_message: outcome.error.clone().unwrap_or_default(),
            batch_id: outcome.batch_id.clone(),
            sent_at: now,
            created_at: now,
        }
    }
}

/// What a history row records about one attempt, before ids and timestamps.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub batch_id: String,
    pub error: Option<String>,
}

/// Aggregate counters over a user's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_sent: u64,
    pub total_failed: u64,
    pub single_emails: u64,
    pub bulk_emails: u64,
    pub last_7_days_sent: u64,
    pub last_7_days_failed: u64,
}

/// Tokens returned by Google's token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Identity resolved from a Google token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
}

/// One outgoing message, already personalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMessage {
    /// Minimal RFC 822 form accepted by the Gmail send endpoint.
    pub fn to_rfc822(&self) -> String {
        format!(
            "To: {}\r\nSubject: {}\r\n\r\n{}",
            self.to, self.subject, self.body
        )
    }
}

/// Failure reported by the mail sender. The text is stored verbatim in history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Public view of a user. Never carries the password hash or OAuth tokens.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gmail_token: Option<GmailTokenView>,
}

impl UserView {
    pub fn new(user: &User, credential: Option<&GmailCredential>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            gmail_token: credential.map(GmailTokenView::from),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GmailTokenView {
    pub token_type: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
    pub scope: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<&GmailCredential> for GmailTokenView {
    fn from(c: &GmailCredential) -> Self {
        Self {
            token_type: c.token_type.clone(),
            expires_at: c.expires_at,
            scope: c.scope.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
