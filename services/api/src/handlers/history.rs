use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_auth_types::identity::Identity;
use courier_core::serde::to_rfc3339_ms;
use courier_domain::history::{EmailKind, EmailStatus};
use courier_domain::pagination::{PageQuery, PageRequest};

use crate::domain::types::{EmailHistoryRecord, HistoryStats};
use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::history::{HistoryStatsUseCase, KindFilter, ListHistoryUseCase};

#[derive(Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_type: EmailKind,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    pub error_message: String,
    pub batch_id: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub sent_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<EmailHistoryRecord> for HistoryItem {
    fn from(r: EmailHistoryRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            email_type: r.kind,
            recipient_email: r.recipient_email,
            recipient_name: r.recipient_name,
            subject: r.subject,
            body: r.body,
            status: r.status,
            error_message: r.error_message,
            batch_id: r.batch_id,
            sent_at: r.sent_at,
            created_at: r.created_at,
        }
    }
}

// ── GET /api/gmail/history ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

pub async fn list_history(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ListHistoryUseCase {
        history: state.history_repo(),
    };
    let out = usecase
        .execute(
            identity.user_id,
            KindFilter::parse(query.kind.as_deref()),
            PageRequest::from(query.page),
        )
        .await?;
    Ok(Json(HistoryResponse {
        history: out.history.into_iter().map(HistoryItem::from).collect(),
        total_count: out.total_count,
        page: out.page,
        page_size: out.page_size,
        total_pages: out.total_pages,
    }))
}

// ── GET /api/gmail/history/stats ─────────────────────────────────────────────

pub async fn history_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<HistoryStats>, ApiError> {
    let usecase = HistoryStatsUseCase {
        history: state.history_repo(),
    };
    Ok(Json(usecase.execute(identity.user_id).await?))
}
