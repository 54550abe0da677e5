// ── Query builder ──
//
// Owns the table's page/limit/search state and derives one Query from it.
// Changing the limit or the search text resets the page to 1; every setter
// reports whether the derived Query actually changed.

use tracing::debug;

use crate::config::PageLimits;
use crate::error::CoreError;
use crate::model::{Query, normalize_search};

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    page: u32,
    limit: u32,
    search: Option<String>,
    limits: PageLimits,
}

impl QueryBuilder {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            page: 1,
            limit: limits.default_limit(),
            search: None,
            limits,
        }
    }

    pub fn query(&self) -> Query {
        Query::new(self.page, self.limit, self.search.as_deref())
    }

    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    /// Page numbers below 1 are clamped to 1.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Switch page size. Only sizes offered by the size picker are accepted.
    pub fn set_limit(&mut self, limit: u32) -> Result<bool, CoreError> {
        if !self.limits.contains(limit) {
            return Err(CoreError::InvalidQuery {
                message: format!(
                    "page size {limit} is not one of {:?}",
                    self.limits.allowed()
                ),
            });
        }
        if limit == self.limit {
            return Ok(false);
        }
        debug!(from = self.limit, to = limit, "page size changed, back to page 1");
        self.limit = limit;
        self.page = 1;
        Ok(true)
    }

    /// Apply a (debounced) search value. Blank text clears the search.
    /// Re-applying the current search leaves the page where it is.
    pub fn set_search(&mut self, raw: &str) -> bool {
        let search = normalize_search(raw);
        if search == self.search {
            return false;
        }
        self.search = search;
        self.page = 1;
        true
    }

    /// Pull the page back inside `1..=total_pages` after the backend reports
    /// fewer pages than the current page number (e.g. after deletes).
    pub fn clamp_to(&mut self, total_pages: u64) -> bool {
        let last = u32::try_from(total_pages.max(1)).unwrap_or(u32::MAX);
        if self.page <= last {
            return false;
        }
        self.page = last;
        true
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(PageLimits::default())
    }
}
