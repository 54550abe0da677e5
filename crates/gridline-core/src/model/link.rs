// ── Link target ──
//
// A row may point at an internal page or at an external URL, never both.
// The external URL wins when a backend sends both.

use std::fmt;

use serde::Serialize;
use url::Url;

use super::Row;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    LinkedToPage { name: String, slug: String },
    LinkedToExternalUrl { url: Url },
    Unlinked,
}

impl LinkTarget {
    /// Resolve a row's link fields.
    ///
    /// `url_path` holds an external URL string; `page_path` holds an object
    /// with a name field and a `slug`. An unparseable URL counts as absent.
    pub fn from_row(row: &Row, page_path: &str, url_path: &str) -> Self {
        if let Some(url) = row
            .text(url_path)
            .and_then(|raw| Url::parse(raw.trim()).ok())
        {
            return Self::LinkedToExternalUrl { url };
        }

        let name = row
            .text(&format!("{page_path}.nameEn"))
            .or_else(|| row.text(&format!("{page_path}.name")));
        let slug = row.text(&format!("{page_path}.slug"));
        match (name, slug) {
            (Some(name), Some(slug)) => Self::LinkedToPage { name, slug },
            (Some(name), None) => Self::LinkedToPage {
                name,
                slug: String::new(),
            },
            (None, Some(slug)) => Self::LinkedToPage {
                name: slug.clone(),
                slug,
            },
            (None, None) => Self::Unlinked,
        }
    }

    pub fn is_linked(&self) -> bool {
        !matches!(self, Self::Unlinked)
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkedToPage { name, slug } if slug.is_empty() => write!(f, "{name}"),
            Self::LinkedToPage { name, slug } => write!(f, "{name} (/{slug})"),
            Self::LinkedToExternalUrl { url } => write!(f, "External Link: {url}"),
            Self::Unlinked => f.write_str("Unlinked"),
        }
    }
}
