use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use courier_core::error::error_response;

/// API error variants. Every request-level failure maps to exactly one of these.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("No emails provided")]
    NoRecipients,
    #[error("Maximum {max} emails allowed per batch", max = courier_domain::recipient::MAX_BULK_RECIPIENTS)]
    TooManyRecipients,
    #[error("{0}")]
    InvalidCsv(String),
    #[error("No valid Google token provided")]
    MissingGoogleToken,
    #[error("Authorization header required")]
    Unauthorized,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid Google token")]
    InvalidGoogleToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Gmail account not connected")]
    GmailNotConnected,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Failed to send email: {0}")]
    SendFailed(String),
    #[error("upstream request failed")]
    Upstream(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NoRecipients => "NO_RECIPIENTS",
            Self::TooManyRecipients => "TOO_MANY_RECIPIENTS",
            Self::InvalidCsv(_) => "INVALID_CSV",
            Self::MissingGoogleToken => "MISSING_GOOGLE_TOKEN",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidGoogleToken => "INVALID_GOOGLE_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::GmailNotConnected => "GMAIL_NOT_CONNECTED",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::SendFailed(_) => "SEND_FAILED",
            Self::Upstream(_) => "UPSTREAM",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::NoRecipients
            | Self::TooManyRecipients
            | Self::InvalidCsv(_)
            | Self::MissingGoogleToken => StatusCode::BAD_REQUEST,
            Self::Unauthorized
            | Self::InvalidToken
            | Self::InvalidCredentials
            | Self::InvalidGoogleToken => StatusCode::UNAUTHORIZED,
            Self::UserNotFound | Self::GmailNotConnected => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::SendFailed(_) | Self::Upstream(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(e) | Self::Upstream(e) => {
                tracing::error!(error = format!("{e:#}"), kind = self.kind(), "request failed");
            }
            Self::SendFailed(detail) => {
                tracing::error!(error = %detail, kind = self.kind(), "gmail send failed");
            }
            _ => {}
        }
        error_response(status, self.kind(), &self.to_string())
    }
}
