//! Pagination for history listings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Raw query parameters as sent by the client.
///
/// Kept as strings so a malformed value falls back to its default instead of rejecting
/// the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Validated pagination parameters.
///
/// - `page`: ≥ 1, default 1
/// - `page_size`: 1–100, default 20 (anything outside the range resets to 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<PageQuery> for PageRequest {
    fn from(q: PageQuery) -> Self {
        let page = q
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let page_size = q
            .page_size
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, page_size }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// `ceil(total / page_size)`; zero when there are no items.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}
