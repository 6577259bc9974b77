use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use courier_auth_types::identity::Identity;
use courier_domain::recipient::Recipient;

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::bulk::{BulkSendInput, BulkSendOutput, BulkSendUseCase, RecipientResult};
use crate::usecase::csv::{CsvReport, process_upload};

/// Multipart field carrying the uploaded file.
pub const CSV_FIELD: &str = "csv_file";

// ── POST /api/gmail/process-csv ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct CsvResponse {
    pub total_records: usize,
    pub valid_emails: Vec<Recipient>,
    pub errors: Vec<String>,
}

impl From<CsvReport> for CsvResponse {
    fn from(report: CsvReport) -> Self {
        Self {
            total_records: report.total_records,
            valid_emails: report.valid_emails,
            errors: report.errors,
        }
    }
}

pub async fn process_csv(
    identity: Identity,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload_error = |e: MultipartError| ApiError::InvalidCsv(format!("Failed to read upload: {e}"));

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let data = field.bytes().await.map_err(upload_error)?;

        let report = process_upload(&file_name, &data)?;
        tracing::info!(
            user_id = %identity.user_id,
            total_records = report.total_records,
            valid = report.valid_emails.len(),
            errors = report.errors.len(),
            "csv processed"
        );
        return Ok(Json(CsvResponse::from(report)));
    }

    Err(ApiError::InvalidCsv("No CSV file provided".to_owned()))
}

// ── POST /api/gmail/send-bulk ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BulkSendRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub emails: Vec<Recipient>,
}

#[derive(Serialize)]
pub struct BulkResultItem {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RecipientResult> for BulkResultItem {
    fn from(r: RecipientResult) -> Self {
        Self {
            email: r.email,
            success: r.success,
            error: r.error,
        }
    }
}

#[derive(Serialize)]
pub struct BulkSendResponse {
    pub batch_id: String,
    pub total_emails: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BulkResultItem>,
    /// Human-readable wall time, e.g. `1.204s`.
    pub processing_time: String,
}

impl From<BulkSendOutput> for BulkSendResponse {
    fn from(out: BulkSendOutput) -> Self {
        Self {
            batch_id: out.batch_id,
            total_emails: out.total_emails,
            success_count: out.success_count,
            failure_count: out.failure_count,
            results: out.results.into_iter().map(BulkResultItem::from).collect(),
            processing_time: format!("{:?}", out.processing_time),
        }
    }
}

pub async fn send_bulk(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<BulkSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = BulkSendUseCase {
        credentials: state.gmail_credential_repo(),
        mailer: Arc::new(state.mail_sender()),
        history: Arc::new(state.history_repo()),
        settings: state.bulk,
    };
    let out = usecase
        .execute(
            identity.user_id,
            BulkSendInput {
                subject: body.subject,
                body: body.body,
                recipients: body.emails,
            },
        )
        .await?;
    Ok(Json(BulkSendResponse::from(out)))
}
