// ── Remote collection cache ──
//
// Single source of truth for what a table renders. Holds the last
// successfully fetched page for the current query, publishes every change
// through a `watch` channel, and drops responses that were superseded.
//
// Every load takes a ticket from a generation counter; a response is only
// applied if its ticket is still the newest when it resolves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::CollectionBackend;
use crate::error::CoreError;
use crate::model::{EntityId, Pagination, Query, Row};
use crate::selection::SelectionContext;

/// What the table sees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionState {
    /// The most recently requested query (possibly still loading).
    pub query: Option<Query>,
    /// Rows of the last applied response. Kept while a newer fetch loads.
    pub rows: Arc<Vec<Row>>,
    pub pagination: Pagination,
    /// Items of the last response dropped for lack of an identifier.
    pub skipped: usize,
    pub is_loading: bool,
    /// Failure of the most recent load, cleared by the next success.
    pub error: Option<CoreError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CollectionState {
    pub fn has_loaded(&self) -> bool {
        self.fetched_at.is_some()
    }
}

/// Result of a fetch request, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The response was applied to the state.
    Applied,
    /// The query equals the current one; nothing was sent.
    Unchanged,
    /// A newer fetch started before this one resolved; the response was dropped.
    Stale,
    /// The fetch failed; the error is also recorded in the state.
    Failed(CoreError),
    /// The cache was closed (table unmounted).
    Closed,
}

pub struct CollectionCache<B> {
    backend: Arc<B>,
    selection: SelectionContext,
    state: watch::Sender<CollectionState>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl<B: CollectionBackend> CollectionCache<B> {
    /// The cache mirrors its rows into `selection` as the visible set.
    pub fn new(backend: Arc<B>, selection: SelectionContext) -> Self {
        let (state, _) = watch::channel(CollectionState::default());
        Self {
            backend,
            selection,
            state,
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> CollectionState {
        self.state.borrow().clone()
    }

    pub fn rows(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.state.borrow().rows)
    }

    pub fn subscribe(&self) -> watch::Receiver<CollectionState> {
        self.state.subscribe()
    }

    // ── Loads ────────────────────────────────────────────────────────

    /// Fetch `query` unless it is already the current query.
    pub async fn fetch(&self, query: Query) -> FetchOutcome {
        if self.is_closed() {
            return FetchOutcome::Closed;
        }
        if self.state.borrow().query.as_ref() == Some(&query) {
            return FetchOutcome::Unchanged;
        }
        self.load(query).await
    }

    /// Re-fetch the current query (after a mutation, or a manual retry).
    pub async fn refresh(&self) -> FetchOutcome {
        if self.is_closed() {
            return FetchOutcome::Closed;
        }
        let current = self.state.borrow().query.clone();
        match current {
            Some(query) => self.load(query).await,
            None => FetchOutcome::Unchanged,
        }
    }

    /// Manual retry after a failure. Same as `refresh`.
    pub async fn retry(&self) -> FetchOutcome {
        self.refresh().await
    }

    async fn load(&self, query: Query) -> FetchOutcome {
        // Bump generation; any in-flight load with an older ticket is dropped.
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_modify(|state| {
            state.query = Some(query.clone());
            state.is_loading = true;
        });
        debug!(ticket, page = query.page(), limit = query.limit(), search = ?query.search(), "fetching");

        let result = self.backend.list(&query).await;

        if self.is_closed() {
            debug!(ticket, "discarding response after close");
            return FetchOutcome::Closed;
        }
        if self.generation.load(Ordering::Acquire) != ticket {
            debug!(ticket, "discarding stale response");
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let rows = Arc::new(page.rows);
                info!(
                    rows = rows.len(),
                    total = page.pagination.total,
                    "page loaded"
                );
                self.state.send_modify(|state| {
                    state.rows = Arc::clone(&rows);
                    state.pagination = page.pagination;
                    state.skipped = page.skipped;
                    state.is_loading = false;
                    state.error = None;
                    state.fetched_at = Some(Utc::now());
                });
                self.selection.set_visible(rows);
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "fetch failed");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(e.clone());
                });
                FetchOutcome::Failed(e)
            }
        }
    }

    // ── Local mutations ──────────────────────────────────────────────

    /// Drop a row from the visible page without waiting for a refetch.
    /// Pagination stays as the last fetch reported it.
    pub fn remove_local(&self, id: &EntityId) -> bool {
        let mut removed = None;
        self.state.send_if_modified(|state| {
            if !state.rows.iter().any(|row| row.id() == id) {
                return false;
            }
            let rows: Vec<Row> = state
                .rows
                .iter()
                .filter(|row| row.id() != id)
                .cloned()
                .collect();
            let rows = Arc::new(rows);
            state.rows = Arc::clone(&rows);
            removed = Some(rows);
            true
        });
        match removed {
            Some(rows) => {
                self.selection.set_visible(rows);
                true
            }
            None => false,
        }
    }
}

// Unmount handling needs no backend bound, so `Drop` impls can use it.
impl<B> CollectionCache<B> {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop applying responses. In-flight loads resolve to `Closed`.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.state.send_modify(|state| state.is_loading = false);
        debug!("collection cache closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    use serde_json::{Value, json};
    use tokio::sync::{Mutex, oneshot};

    use super::*;
    use crate::backend::Page;

    /// Backend whose list responses are released by the test, per search term.
    #[derive(Default)]
    struct GatedBackend {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<Page, CoreError>>>>,
        calls: AtomicUsize,
    }

    impl GatedBackend {
        async fn gate(&self, search: &str) -> oneshot::Sender<Result<Page, CoreError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().await.insert(search.to_owned(), rx);
            tx
        }
    }

    impl CollectionBackend for GatedBackend {
        async fn list(&self, query: &Query) -> Result<Page, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = query.search().unwrap_or_default().to_owned();
            let gate = self.gates.lock().await.remove(&key);
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(CoreError::Internal("gate dropped".into()))),
                None => Ok(Page::default()),
            }
        }

        async fn create(&self, _payload: &Value) -> Result<Row, CoreError> {
            Err(CoreError::Internal("unused".into()))
        }

        async fn update(&self, _id: &EntityId, _payload: &Value) -> Result<Row, CoreError> {
            Err(CoreError::Internal("unused".into()))
        }

        async fn delete(&self, _id: &EntityId) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn page(names: &[&str]) -> Page {
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, name)| Row::from_value(json!({ "id": i + 1, "name": name })).unwrap())
            .collect::<Vec<_>>();
        let total = rows.len() as u64;
        Page {
            rows,
            pagination: Pagination {
                total,
                total_pages: 1,
            },
            skipped: 0,
        }
    }

    fn cache(backend: &Arc<GatedBackend>) -> CollectionCache<GatedBackend> {
        CollectionCache::new(Arc::clone(backend), SelectionContext::new())
    }

    fn search(term: &str) -> Query {
        Query::new(1, 10, Some(term))
    }

    #[tokio::test]
    async fn newer_response_wins_over_late_older_one() {
        let backend = Arc::new(GatedBackend::default());
        let cache = cache(&backend);
        let gate_a = backend.gate("a").await;
        let gate_b = backend.gate("b").await;

        let (first, second, ()) = tokio::join!(cache.fetch(search("a")), cache.fetch(search("b")), async {
            tokio::task::yield_now().await;
            gate_b.send(Ok(page(&["from b"]))).unwrap();
            tokio::task::yield_now().await;
            gate_a.send(Ok(page(&["from a"]))).unwrap();
        });

        assert_eq!(first, FetchOutcome::Stale);
        assert_eq!(second, FetchOutcome::Applied);
        let state = cache.snapshot();
        assert_eq!(state.rows[0].text("name").as_deref(), Some("from b"));
        assert_eq!(state.query, Some(search("b")));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn equal_query_is_not_refetched() {
        let backend = Arc::new(GatedBackend::default());
        let cache = cache(&backend);
        assert_eq!(cache.fetch(search("x")).await, FetchOutcome::Applied);
        assert_eq!(cache.fetch(search("x")).await, FetchOutcome::Unchanged);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        assert_eq!(cache.refresh().await, FetchOutcome::Applied);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_keeps_previous_rows() {
        let backend = Arc::new(GatedBackend::default());
        let cache = cache(&backend);
        let ok = backend.gate("ok").await;
        ok.send(Ok(page(&["kept"]))).unwrap();
        cache.fetch(search("ok")).await;

        let fail = backend.gate("down").await;
        let down = CoreError::Network {
            message: "connection refused".into(),
            timed_out: false,
        };
        fail.send(Err(down.clone())).unwrap();
        assert_eq!(cache.fetch(search("down")).await, FetchOutcome::Failed(down.clone()));

        let state = cache.snapshot();
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.error, Some(down));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn response_after_close_is_ignored() {
        let backend = Arc::new(GatedBackend::default());
        let cache = cache(&backend);
        let gate = backend.gate("late").await;

        let (outcome, ()) = tokio::join!(cache.fetch(search("late")), async {
            tokio::task::yield_now().await;
            cache.close();
            gate.send(Ok(page(&["late"]))).unwrap();
        });

        assert_eq!(outcome, FetchOutcome::Closed);
        assert!(cache.snapshot().rows.is_empty());
        assert_eq!(cache.fetch(search("other")).await, FetchOutcome::Closed);
    }

    #[tokio::test]
    async fn remove_local_updates_rows_but_not_pagination() {
        let backend = Arc::new(GatedBackend::default());
        let selection = SelectionContext::new();
        let cache = CollectionCache::new(Arc::clone(&backend), selection.clone());
        let gate = backend.gate("").await;
        gate.send(Ok(page(&["one", "two"]))).unwrap();
        cache.fetch(Query::new(1, 10, None)).await;
        let before = cache.snapshot().pagination;

        assert!(cache.remove_local(&EntityId::Number(1)));
        assert!(!cache.remove_local(&EntityId::Number(1)));
        let state = cache.snapshot();
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.pagination, before);
        assert_eq!(state.pagination.total, 2);
        assert_eq!(selection.visible().len(), 1);
    }
}
