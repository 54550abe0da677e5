// ── Query and pagination value types ──

use serde::{Deserialize, Serialize};

/// One request for a page of a collection.
///
/// Constructed only through [`Query::new`], which clamps page and limit to
/// at least 1 and normalizes search text, so a `Query` is always sendable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    page: u32,
    limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    search: Option<String>,
}

impl Query {
    pub fn new(page: u32, limit: u32, search: Option<&str>) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            search: search.and_then(normalize_search),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Request parameters; `search` is omitted entirely when absent.
    pub fn params(&self) -> gridline_api::ListParams {
        gridline_api::ListParams {
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
        }
    }
}

/// Trim search text; blank input means "no search".
pub fn normalize_search(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Pagination metadata reported by the backend for the current query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub total_pages: u64,
}

impl From<gridline_api::PaginationResponse> for Pagination {
    fn from(p: gridline_api::PaginationResponse) -> Self {
        Self {
            total: p.total,
            total_pages: p.total_pages,
        }
    }
}
