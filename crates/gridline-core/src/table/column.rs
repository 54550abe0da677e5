// ── Column descriptors ──
//
// Each column is tagged with an explicit render function that is total
// over any row shape, plus the row fields it reads so the table can be
// validated against a declared schema up front.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use crate::dispatch::RowIntent;
use crate::error::CoreError;
use crate::model::{LinkTarget, Row};

pub type RenderFn = Arc<dyn Fn(&Row) -> Cell + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Clone)]
pub enum ColumnKind {
    Data { render: RenderFn, fields: Vec<String> },
    Actions { intents: Vec<RowIntent> },
}

#[derive(Clone)]
pub struct Column {
    uid: String,
    label: String,
    align: Align,
    kind: ColumnKind,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ColumnKind::Data { fields, .. } => format!("Data({fields:?})"),
            ColumnKind::Actions { intents } => format!("Actions({intents:?})"),
        };
        f.debug_struct("Column")
            .field("uid", &self.uid)
            .field("label", &self.label)
            .field("align", &self.align)
            .field("kind", &kind)
            .finish()
    }
}

impl Column {
    // ── Constructors ─────────────────────────────────────────────────

    /// Column with a caller-supplied render function reading `fields`.
    pub fn custom<F>(
        uid: impl Into<String>,
        label: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
        render: F,
    ) -> Self
    where
        F: Fn(&Row) -> Cell + Send + Sync + 'static,
    {
        Self {
            uid: uid.into(),
            label: label.into(),
            align: Align::Start,
            kind: ColumnKind::Data {
                render: Arc::new(render),
                fields: fields.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Plain text of the field named like the column.
    pub fn text(uid: impl Into<String>, label: impl Into<String>) -> Self {
        let uid = uid.into();
        let path = uid.clone();
        Self::field(uid, label, path)
    }

    /// Plain text of an arbitrary (dotted) field path.
    pub fn field(uid: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let read = path.clone();
        Self::custom(uid, label, [path], move |row| {
            row.text(&read).map_or(Cell::Placeholder, Cell::text)
        })
    }

    /// Primary value with a muted secondary value underneath.
    pub fn stacked(
        uid: impl Into<String>,
        label: impl Into<String>,
        primary: impl Into<String>,
        secondary: impl Into<String>,
        secondary_format: TextFormat,
    ) -> Self {
        let primary = primary.into();
        let secondary = secondary.into();
        let (p, s) = (primary.clone(), secondary.clone());
        Self::custom(uid, label, [primary, secondary], move |row| {
            let second = secondary_format.apply(row, &s);
            match row.text(&p) {
                Some(first) => Cell::stacked(first, second),
                None => second.map_or(Cell::Placeholder, |second| Cell::stacked(second, None)),
            }
        })
    }

    /// Badge-style value.
    pub fn chip(uid: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let read = path.clone();
        Self::custom(uid, label, [path], move |row| {
            row.text(&read).map_or(Cell::Placeholder, Cell::chip)
        })
    }

    /// Timestamp shown as a calendar date.
    pub fn date(uid: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let read = path.clone();
        Self::custom(uid, label, [path], move |row| {
            TextFormat::Date
                .apply(row, &read)
                .map_or(Cell::Placeholder, Cell::text)
        })
    }

    /// Internal page reference or external URL, see [`LinkTarget`].
    pub fn link(
        uid: impl Into<String>,
        label: impl Into<String>,
        page_path: impl Into<String>,
        url_path: impl Into<String>,
    ) -> Self {
        let page_path = page_path.into();
        let url_path = url_path.into();
        let (page, url) = (page_path.clone(), url_path.clone());
        Self::custom(uid, label, [page_path, url_path], move |row| Cell::Link {
            target: LinkTarget::from_row(row, &page, &url),
        })
    }

    /// The row-actions column.
    pub fn actions(
        uid: impl Into<String>,
        label: impl Into<String>,
        intents: impl IntoIterator<Item = RowIntent>,
    ) -> Self {
        Self {
            uid: uid.into(),
            label: label.into(),
            align: Align::Center,
            kind: ColumnKind::Actions {
                intents: intents.into_iter().collect(),
            },
        }
    }

    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn align(&self) -> Align {
        self.align
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_actions(&self) -> bool {
        matches!(self.kind, ColumnKind::Actions { .. })
    }

    /// Row fields this column reads. Empty for the actions column.
    pub fn fields(&self) -> &[String] {
        match &self.kind {
            ColumnKind::Data { fields, .. } => fields,
            ColumnKind::Actions { .. } => &[],
        }
    }

    pub fn render(&self, row: &Row) -> Cell {
        match &self.kind {
            ColumnKind::Data { render, .. } => render(row),
            ColumnKind::Actions { intents } => Cell::Intents {
                intents: intents.clone(),
            },
        }
    }
}

// ── Text formats ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    #[default]
    Text,
    /// RFC 3339 timestamps and ISO dates become `YYYY-MM-DD`; anything
    /// else is shown as-is.
    Date,
}

impl TextFormat {
    fn apply(self, row: &Row, path: &str) -> Option<String> {
        let raw = row.text(path)?;
        Some(match self {
            Self::Text => raw,
            Self::Date => format_date(&raw).unwrap_or(raw),
        })
    }
}

fn format_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive().format("%Y-%m-%d").to_string());
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

// ── Schema ──────────────────────────────────────────────────────────

/// The fields a collection's rows are declared to have.
///
/// A dotted path is permitted when its first segment is declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSchema {
    fields: Option<IndexSet<String>>,
}

impl RowSchema {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// A schema that permits every field.
    pub fn open() -> Self {
        Self { fields: None }
    }

    pub fn permits(&self, path: &str) -> bool {
        let root = path.split('.').next().unwrap_or(path);
        self.fields
            .as_ref()
            .is_none_or(|fields| fields.contains(root))
    }
}

// ── Configuration form ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Stacked,
    Chip,
    Date,
    Link,
    Actions,
}

/// A column as written in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
    /// Field read by the column; defaults to `uid`. For links, the page object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Secondary field of a stacked column, or the URL field of a link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default)]
    pub secondary_format: TextFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<RowIntent>,
}

impl ColumnConfig {
    pub fn to_column(&self) -> Result<Column, CoreError> {
        if self.uid.trim().is_empty() {
            return Err(CoreError::InvalidTable {
                message: "column uid must not be empty".into(),
            });
        }
        let uid = self.uid.clone();
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| uid.replace(['_', '.'], " ").to_uppercase());
        let field = self.field.clone().unwrap_or_else(|| uid.clone());
        let secondary = || {
            self.secondary.clone().ok_or_else(|| CoreError::InvalidTable {
                message: format!("column `{uid}` needs a `secondary` field"),
            })
        };

        let column = match self.column_type {
            ColumnType::Text => Column::field(uid.clone(), label, field),
            ColumnType::Chip => Column::chip(uid.clone(), label, field),
            ColumnType::Date => Column::date(uid.clone(), label, field),
            ColumnType::Stacked => Column::stacked(
                uid.clone(),
                label,
                field,
                secondary()?,
                self.secondary_format,
            ),
            ColumnType::Link => Column::link(uid.clone(), label, field, secondary()?),
            ColumnType::Actions => {
                let intents = if self.intents.is_empty() {
                    vec![RowIntent::Edit, RowIntent::Delete]
                } else {
                    self.intents.clone()
                };
                Column::actions(uid.clone(), label, intents)
            }
        };
        Ok(match self.align {
            Some(align) => column.with_align(align),
            None => column,
        })
    }
}
