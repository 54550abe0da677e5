// ── Table session ──
//
// One mounted table instance: query builder, debounced search, cache,
// selection, actions and import for a single collection, wired together.
// Dropping (or closing) the session cancels the pending search timer and
// stops in-flight responses from being applied.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::backend::CollectionBackend;
use crate::config::{CollectionConfig, EngineConfig};
use crate::dispatch::{ActionDispatcher, Notification, Notifier};
use crate::error::CoreError;
use crate::export::write_csv;
use crate::import::ImportPipeline;
use crate::model::Query;
use crate::query::{Debouncer, QueryBuilder};
use crate::selection::SelectionContext;
use crate::store::{CollectionCache, FetchOutcome};
use crate::table::{Grid, TableSpec};

pub struct TableSession<B> {
    collection: CollectionConfig,
    builder: QueryBuilder,
    cache: Arc<CollectionCache<B>>,
    selection: SelectionContext,
    dispatcher: ActionDispatcher<B>,
    importer: ImportPipeline<B>,
    search_input: Debouncer<String>,
    debounced: mpsc::UnboundedReceiver<String>,
}

impl<B: CollectionBackend> TableSession<B> {
    /// Mount a table over `backend`. Must be called inside a tokio runtime
    /// (the search debouncer spawns its timer task).
    ///
    /// Every mutation and import outcome is delivered on the returned
    /// notification receiver.
    pub fn mount(
        backend: Arc<B>,
        engine: &EngineConfig,
        collection: CollectionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifier, notifications) = Notifier::channel();
        let selection = SelectionContext::new();
        let cache = Arc::new(CollectionCache::new(backend, selection.clone()));
        let dispatcher = ActionDispatcher::new(Arc::clone(&cache), selection.clone(), notifier.clone());
        let importer = ImportPipeline::new(
            Arc::clone(&cache),
            collection.import.clone(),
            engine.import_concurrency,
            notifier,
        );
        let (search_input, debounced) = Debouncer::new(engine.debounce);

        debug!(collection = %collection.name, "table mounted");
        let session = Self {
            builder: QueryBuilder::new(engine.page_limits.clone()),
            collection,
            cache,
            selection,
            dispatcher,
            importer,
            search_input,
            debounced,
        };
        (session, notifications)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn collection(&self) -> &CollectionConfig {
        &self.collection
    }

    pub fn query(&self) -> Query {
        self.builder.query()
    }

    pub fn cache(&self) -> &Arc<CollectionCache<B>> {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<B> {
        &self.dispatcher
    }

    pub fn importer(&self) -> &ImportPipeline<B> {
        &self.importer
    }

    // ── Query changes ────────────────────────────────────────────────

    /// Query state before the first fetch (e.g. from command-line flags).
    /// Changes made here are fetched by the next `start` or `refresh`.
    pub fn query_builder(&mut self) -> &mut QueryBuilder {
        &mut self.builder
    }

    /// Initial load with the builder's current query.
    pub async fn start(&mut self) -> FetchOutcome {
        self.sync().await
    }

    pub async fn set_page(&mut self, page: u32) -> FetchOutcome {
        self.builder.set_page(page);
        self.sync().await
    }

    /// Change the page size; the page goes back to 1 before the fetch.
    pub async fn set_limit(&mut self, limit: u32) -> Result<FetchOutcome, CoreError> {
        self.builder.set_limit(limit)?;
        Ok(self.sync().await)
    }

    /// Raw keystroke input. Nothing is fetched until the input has been
    /// quiet for the debounce window; see [`next_search`](Self::next_search).
    pub fn type_search(&self, raw: impl Into<String>) -> bool {
        self.search_input.push(raw.into())
    }

    /// Wait for the next debounced search value and fetch it.
    /// Returns `None` once the session is closed.
    pub async fn next_search(&mut self) -> Option<FetchOutcome> {
        let search = self.debounced.recv().await?;
        Some(self.apply_search(&search).await)
    }

    /// Apply a search value immediately, bypassing the debounce window.
    pub async fn apply_search(&mut self, raw: &str) -> FetchOutcome {
        self.builder.set_search(raw);
        self.sync().await
    }

    /// Re-fetch the current query (manual retry).
    pub async fn refresh(&self) -> FetchOutcome {
        self.cache.refresh().await
    }

    /// Fetch the builder's query; if the backend reports fewer pages than
    /// the current page, fall back to the last page and fetch again.
    async fn sync(&mut self) -> FetchOutcome {
        let outcome = self.cache.fetch(self.builder.query()).await;
        if outcome == FetchOutcome::Applied {
            let total_pages = self.cache.snapshot().pagination.total_pages;
            if self.builder.clamp_to(total_pages) {
                info!(page = self.builder.query().page(), "page out of range, clamped");
                return self.cache.fetch(self.builder.query()).await;
            }
        }
        outcome
    }

    // ── Output ───────────────────────────────────────────────────────

    pub fn render(&self, spec: &TableSpec) -> Grid {
        let empty = format!("No {} found", self.collection.label);
        spec.render(&self.cache.snapshot(), &self.selection.snapshot(), &empty)
    }

    /// "8 of 8 sub menus"
    pub fn footer_text(&self, grid: &Grid) -> String {
        grid.footer.describe(&self.collection.label)
    }

    /// CSV of the loaded page (not the whole remote collection).
    pub fn export(&self) -> Result<Vec<u8>, CoreError> {
        let mut out = Vec::new();
        write_csv(&mut out, &self.cache.rows(), &self.collection.export)?;
        Ok(out)
    }

    /// CSV of the selected rows, or the whole loaded page when nothing is
    /// selected.
    pub fn export_selection(&self) -> Result<Vec<u8>, CoreError> {
        let mut out = Vec::new();
        write_csv(&mut out, &self.selection.effective_rows(), &self.collection.export)?;
        Ok(out)
    }

    // ── Unmount ──────────────────────────────────────────────────────

    pub fn close(&self) {
        self.search_input.shutdown();
        self.cache.close();
    }

    pub fn is_closed(&self) -> bool {
        self.cache.is_closed()
    }
}

impl<B> Drop for TableSession<B> {
    fn drop(&mut self) {
        self.search_input.shutdown();
        self.cache.close();
    }
}
