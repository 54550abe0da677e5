// ── Rendered cell values ──

use std::fmt;

use serde::Serialize;

use crate::dispatch::RowIntent;
use crate::model::LinkTarget;

/// Neutral placeholder for missing values.
pub const PLACEHOLDER: &str = "\u{2014}";

/// The output of a column render function: a presentation value, never an
/// error. Missing data renders as [`Cell::Placeholder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cell {
    Text { text: String },
    /// A primary line with a muted secondary line beneath it.
    Stacked {
        primary: String,
        secondary: Option<String>,
    },
    Chip { text: String },
    Link { target: LinkTarget },
    Placeholder,
    /// Row actions: clicking one goes to the action dispatcher.
    Intents { intents: Vec<RowIntent> },
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn chip(text: impl Into<String>) -> Self {
        Self::Chip { text: text.into() }
    }

    pub fn stacked(primary: impl Into<String>, secondary: Option<String>) -> Self {
        Self::Stacked {
            primary: primary.into(),
            secondary,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Chip { text } => write!(f, "[{text}]"),
            Self::Stacked {
                primary,
                secondary: Some(secondary),
            } => write!(f, "{primary}\n{secondary}"),
            Self::Stacked {
                primary,
                secondary: None,
            } => f.write_str(primary),
            Self::Link { target } => write!(f, "{target}"),
            Self::Placeholder => f.write_str(PLACEHOLDER),
            Self::Intents { intents } => {
                let labels: Vec<&str> = intents.iter().map(RowIntent::label).collect();
                f.write_str(&labels.join(" | "))
            }
        }
    }
}
