//! Headless data-table engine for paginated REST collections.
//!
//! One [`TableSession`] per mounted table ties together:
//!
//! - **[`QueryBuilder`]** and a trailing-edge [`Debouncer`] for search input.
//!   Changing the page size or the search text resets the page to 1.
//!
//! - **[`CollectionCache`]**: the single source of truth for loaded rows,
//!   published through `tokio::sync::watch`. A generation counter drops any
//!   response that was superseded by a newer query or arrived after unmount.
//!
//! - **[`SelectionContext`]**: explicitly scoped shared selection state,
//!   cloned into every component that reads or writes it.
//!
//! - **[`TableSpec`]**: column descriptors with per-column render functions,
//!   validated against a [`RowSchema`] and rendered into a [`Grid`].
//!
//! - **[`ActionDispatcher`]**: row intents, confirmation for deletes, and
//!   one [`Notification`] per mutation outcome.
//!
//! - **[`ImportPipeline`]** / [`export_csv`]: CSV/XLSX bulk create with
//!   per-record outcomes, and CSV export of the loaded page.
//!
//! Data access goes through the [`CollectionBackend`] trait; [`HttpBackend`]
//! implements it on top of `gridline-api`.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod query;
pub mod selection;
pub mod session;
pub mod store;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{CollectionBackend, HttpBackend, Page};
pub use config::{BackendConfig, CollectionConfig, EngineConfig, PageLimits, TlsVerification};
pub use dispatch::{
    ActionDispatcher, ActionState, Effect, Mutation, Notification, NotificationLevel, Notifier,
    RowIntent,
};
pub use error::CoreError;
pub use export::{ExportLayout, export_csv, write_csv};
pub use import::{
    FieldKind, FieldMapping, FileFormat, ImportMapping, ImportOutcome, ImportPipeline,
    ImportReport, ImportResult, Record, parse_records,
};
pub use model::{EntityId, LinkTarget, Pagination, Query, Row};
pub use query::{Debouncer, QueryBuilder};
pub use selection::{SelectionContext, SelectionState};
pub use session::TableSession;
pub use store::{CollectionCache, CollectionState, FetchOutcome};
pub use table::{
    Align, Cell, Column, ColumnConfig, ColumnType, Footer, Grid, GridBody, GridRow, RowSchema,
    TableSpec,
};
