use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_auth_types::identity::Identity;
use courier_core::serde::to_rfc3339_ms;

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::gmail::{
    AuthUrlUseCase, DisconnectGmailUseCase, GmailStatus, GmailStatusUseCase, SendEmailInput,
    SendEmailUseCase,
};

// ── GET /api/gmail/auth-url ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub state: String,
}

pub async fn auth_url(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = AuthUrlUseCase {
        google: state.google.clone(),
    };
    let out = usecase.execute(identity.user_id)?;
    Ok(Json(AuthUrlResponse {
        auth_url: out.auth_url,
        state: out.state,
    }))
}

// ── GET /api/gmail/status ────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    NotConnected {
        connected: bool,
        message: &'static str,
    },
    Connected {
        connected: bool,
        #[serde(serialize_with = "to_rfc3339_ms")]
        expires_at: DateTime<Utc>,
        expired: bool,
        scope: String,
    },
}

impl From<GmailStatus> for StatusResponse {
    fn from(status: GmailStatus) -> Self {
        match status {
            GmailStatus::NotConnected => Self::NotConnected {
                connected: false,
                message: "Gmail account not connected",
            },
            GmailStatus::Connected {
                expires_at,
                expired,
                scope,
            } => Self::Connected {
                connected: true,
                expires_at,
                expired,
                scope,
            },
        }
    }
}

pub async fn status(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GmailStatusUseCase {
        credentials: state.gmail_credential_repo(),
    };
    let status = usecase.execute(identity.user_id).await?;
    Ok(Json(StatusResponse::from(status)))
}

// ── DELETE /api/gmail/disconnect ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub message: &'static str,
    pub connected: bool,
}

pub async fn disconnect(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = DisconnectGmailUseCase {
        credentials: state.gmail_credential_repo(),
    };
    let removed = usecase.execute(identity.user_id).await?;
    let message = if removed {
        "Gmail account disconnected successfully"
    } else {
        "No Gmail account was connected"
    };
    Ok(Json(DisconnectResponse {
        message,
        connected: false,
    }))
}

// ── POST /api/gmail/send ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Serialize)]
pub struct SendEmailResponse {
    pub message: &'static str,
    pub to: String,
    pub subject: String,
    pub from: String,
}

pub async fn send_email(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<SendEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = SendEmailUseCase {
        credentials: state.gmail_credential_repo(),
        mailer: state.mail_sender(),
        history: state.history_repo(),
    };
    let out = usecase
        .execute(
            identity.user_id,
            &identity.email,
            SendEmailInput {
                to: body.to,
                subject: body.subject,
                body: body.body,
            },
        )
        .await?;
    Ok(Json(SendEmailResponse {
        message: "Email sent successfully",
        to: out.to,
        subject: out.subject,
        from: out.from,
    }))
}
