// ── Table presentation contract ──
//
// `TableSpec` is a validated column list; `render` turns the cache and
// selection snapshots into a `Grid` that any front end can draw.
//
// Loading policy: rows already on screen stay visible (marked `busy`)
// while a newer fetch is in flight. The loading body is only used when
// there is nothing to show yet. A failure with no rows on screen renders
// as `Failed`, never as the empty state.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::cell::Cell;
use super::column::{Align, Column, RowSchema};
use crate::error::CoreError;
use crate::model::EntityId;
use crate::selection::SelectionState;
use crate::store::CollectionState;

#[derive(Debug, Clone)]
pub struct TableSpec {
    columns: Vec<Column>,
}

impl TableSpec {
    /// Validate `columns` against the declared row schema.
    pub fn new(columns: Vec<Column>, schema: &RowSchema) -> Result<Self, CoreError> {
        if columns.is_empty() {
            return Err(invalid("a table needs at least one column".into()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.uid()) {
                return Err(invalid(format!("duplicate column uid `{}`", column.uid())));
            }
            if let Some(field) = column.fields().iter().find(|f| !schema.permits(f)) {
                return Err(invalid(format!(
                    "column `{}` reads undeclared field `{field}`",
                    column.uid()
                )));
            }
        }

        if columns.iter().filter(|c| c.is_actions()).count() > 1 {
            return Err(invalid("only one actions column is allowed".into()));
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> Vec<HeaderCell> {
        self.columns
            .iter()
            .map(|c| HeaderCell {
                uid: c.uid().to_owned(),
                label: c.label().to_owned(),
                align: c.align(),
            })
            .collect()
    }

    /// Same table without its actions column (for non-interactive output).
    pub fn without_actions(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|c| !c.is_actions())
                .cloned()
                .collect(),
        }
    }

    pub fn render(
        &self,
        state: &CollectionState,
        selection: &SelectionState,
        empty_message: &str,
    ) -> Grid {
        let body = if state.rows.is_empty() {
            match &state.error {
                _ if state.is_loading => GridBody::Loading,
                Some(e) => GridBody::Failed(e.to_string()),
                None if state.has_loaded() => GridBody::Empty(empty_message.to_owned()),
                None => GridBody::Loading,
            }
        } else {
            GridBody::Rows(
                state
                    .rows
                    .iter()
                    .map(|row| GridRow {
                        id: row.id().clone(),
                        selected: selection.is_selected(row.id()),
                        cells: self.columns.iter().map(|c| c.render(row)).collect(),
                    })
                    .collect(),
            )
        };

        Grid {
            header: self.header(),
            busy: state.is_loading && matches!(body, GridBody::Rows(_)),
            body,
            error: state.error.as_ref().map(ToString::to_string),
            footer: Footer {
                shown: state.rows.len(),
                total: state.pagination.total,
                page: state.query.as_ref().map_or(1, |q| q.page()),
                total_pages: state.pagination.total_pages,
                skipped: state.skipped,
            },
        }
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidTable { message }
}

// ── Grid ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub uid: String,
    pub label: String,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub id: EntityId,
    pub selected: bool,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum GridBody {
    Loading,
    Empty(String),
    /// Nothing to show because the load failed.
    Failed(String),
    Rows(Vec<GridRow>),
}

/// Bottom content: "`shown` of `total`" plus the page control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub shown: usize,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
    /// Rows the backend sent without an identifier; counted in `total`.
    pub skipped: usize,
}

impl Footer {
    /// Number of pages the page control shows; never zero.
    pub fn page_count(&self) -> u64 {
        self.total_pages.max(1)
    }

    /// Summary with the collection's plural label, e.g. "8 of 8 sub menus".
    pub fn describe(&self, label: &str) -> String {
        let mut out = format!("{} of {}", self.shown, self.total);
        if !label.is_empty() {
            out.push(' ');
            out.push_str(label);
        }
        if self.skipped > 0 {
            out.push_str(&format!(" ({} without id not shown)", self.skipped));
        }
        out
    }
}

impl fmt::Display for Footer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(""))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub header: Vec<HeaderCell>,
    pub body: GridBody,
    /// A fetch is in flight while older rows are still shown.
    pub busy: bool,
    pub error: Option<String>,
    pub footer: Footer,
}

impl Grid {
    pub fn rows(&self) -> &[GridRow] {
        match &self.body {
            GridBody::Rows(rows) => rows,
            GridBody::Loading | GridBody::Empty(_) | GridBody::Failed(_) => &[],
        }
    }
}
