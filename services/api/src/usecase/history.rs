use chrono::{Duration, Utc};
use uuid::Uuid;

use courier_domain::history::EmailKind;
use courier_domain::pagination::PageRequest;

use crate::domain::repository::EmailHistoryRepository;
use crate::domain::types::{EmailHistoryRecord, HistoryStats};
use crate::error::ApiError;

/// Width of the "recent activity" window in the stats view.
pub const RECENT_WINDOW_DAYS: i64 = 7;

// ── ListHistory ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct HistoryPage {
    pub history: Vec<EmailHistoryRecord>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

pub struct ListHistoryUseCase<H: EmailHistoryRepository> {
    pub history: H,
}

impl<H: EmailHistoryRepository> ListHistoryUseCase<H> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        filter: KindFilter,
        page: PageRequest,
    ) -> Result<HistoryPage, ApiError> {
        let kind = match filter {
            KindFilter::Any => None,
            KindFilter::Only(kind) => Some(kind),
            KindFilter::Unmatched => {
                return Ok(HistoryPage {
                    history: Vec::new(),
                    total_count: 0,
                    page: page.page,
                    page_size: page.page_size,
                    total_pages: 0,
                });
            }
        };
        let (history, total_count) = self.history.list(user_id, kind, page).await?;
        Ok(HistoryPage {
            history,
            total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages(total_count),
        })
    }
}

/// The `type` query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    /// Absent or empty: every kind.
    Any,
    Only(EmailKind),
    /// A value no row can carry; the listing is empty rather than an error.
    Unmatched,
}

impl KindFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::Any,
            Some(s) => s.parse().map_or(Self::Unmatched, Self::Only),
        }
    }
}

// ── HistoryStats ─────────────────────────────────────────────────────────────

pub struct HistoryStatsUseCase<H: EmailHistoryRepository> {
    pub history: H,
}

impl<H: EmailHistoryRepository> HistoryStatsUseCase<H> {
    pub async fn execute(&self, user_id: Uuid) -> Result<HistoryStats, ApiError> {
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        self.history.stats(user_id, since).await
    }
}
