use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use courier_domain::email::is_valid_email;
use courier_domain::history::EmailKind;

use crate::config::GoogleOAuthConfig;
use crate::domain::repository::{EmailHistoryRepository, GmailCredentialRepository, MailSender};
use crate::domain::types::{DeliveryOutcome, EmailHistoryRecord, OutgoingMessage};
use crate::error::ApiError;

// ── AuthUrl ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AuthUrlOutput {
    pub auth_url: String,
    pub state: String,
}

pub struct AuthUrlUseCase {
    pub google: Arc<GoogleOAuthConfig>,
}

impl AuthUrlUseCase {
    pub fn execute(&self, user_id: Uuid) -> Result<AuthUrlOutput, ApiError> {
        let state = oauth_state(user_id, Utc::now());
        let auth_url = self.google.authorization_url(&state)?.to_string();
        Ok(AuthUrlOutput { auth_url, state })
    }
}

/// `user_<id>_<unix-seconds>`. Not signed.
pub fn oauth_state(user_id: Uuid, now: DateTime<Utc>) -> String {
    format!("user_{}_{}", user_id, now.timestamp())
}

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub enum GmailStatus {
    NotConnected,
    Connected {
        expires_at: DateTime<Utc>,
        /// Always `false`: the stored access token is never refreshed or checked here.
        expired: bool,
        scope: String,
    },
}

pub struct GmailStatusUseCase<C: GmailCredentialRepository> {
    pub credentials: C,
}

impl<C: GmailCredentialRepository> GmailStatusUseCase<C> {
    pub async fn execute(&self, user_id: Uuid) -> Result<GmailStatus, ApiError> {
        Ok(match self.credentials.find_by_user(user_id).await? {
            None => GmailStatus::NotConnected,
            Some(c) => GmailStatus::Connected {
                expires_at: c.expires_at,
                expired: false,
                scope: c.scope,
            },
        })
    }
}

// ── Disconnect ───────────────────────────────────────────────────────────────

pub struct DisconnectGmailUseCase<C: GmailCredentialRepository> {
    pub credentials: C,
}

impl<C: GmailCredentialRepository> DisconnectGmailUseCase<C> {
    /// Returns `true` if a credential existed and was removed.
    pub async fn execute(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let removed = self.credentials.delete_by_user(user_id).await?;
        if removed {
            tracing::info!(user_id = %user_id, "gmail account disconnected");
        }
        Ok(removed)
    }
}

// ── SendEmail ────────────────────────────────────────────────────────────────

pub struct SendEmailInput {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug)]
pub struct SendEmailOutput {
    pub to: String,
    pub subject: String,
    pub from: String,
}

pub struct SendEmailUseCase<C, M, H>
where
    C: GmailCredentialRepository,
    M: MailSender,
    H: EmailHistoryRepository,
{
    pub credentials: C,
    pub mailer: M,
    pub history: H,
}

impl<C, M, H> SendEmailUseCase<C, M, H>
where
    C: GmailCredentialRepository,
    M: MailSender,
    H: EmailHistoryRepository,
{
    pub async fn execute(
        &self,
        user_id: Uuid,
        from: &str,
        input: SendEmailInput,
    ) -> Result<SendEmailOutput, ApiError> {
        let to = input.to.trim().to_owned();
        if !is_valid_email(&to) {
            return Err(ApiError::InvalidInput("to must be a valid email".to_owned()));
        }
        if input.subject.trim().is_empty() {
            return Err(ApiError::InvalidInput("subject is required".to_owned()));
        }
        if input.body.trim().is_empty() {
            return Err(ApiError::InvalidInput("body is required".to_owned()));
        }

        let credential = self
            .credentials
            .find_by_user(user_id)
            .await?
            .ok_or(ApiError::GmailNotConnected)?;

        let message = OutgoingMessage {
            to,
            subject: input.subject,
            body: input.body,
        };
        let result = self.mailer.send(&credential.access_token, &message).await;

        let outcome = DeliveryOutcome {
            recipient_email: message.to.clone(),
            recipient_name: String::new(),
            subject: message.subject.clone(),
            body: message.body.clone(),
            batch_id: String::new(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        let record = EmailHistoryRecord::attempt(user_id, EmailKind::Single, &outcome);
        if let Err(e) = self.history.record(&record).await {
            tracing::warn!(error = %e, user_id = %user_id, "failed to record email history");
        }

        result.map_err(|e| ApiError::SendFailed(e.0))?;
        Ok(SendEmailOutput {
            to: message.to,
            subject: message.subject,
            from: from.to_owned(),
        })
    }
}
