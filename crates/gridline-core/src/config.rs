// ── Runtime engine configuration ──
//
// These types describe how to reach a backend and how one collection is
// queried, rendered, imported and exported. They never touch disk:
// gridline-config (or a test) constructs them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::export::ExportLayout;
use crate::import::ImportMapping;
use crate::table::{ColumnConfig, RowSchema, TableSpec};

pub const DEFAULT_PAGE_SIZES: [u32; 5] = [5, 10, 15, 20, 25];
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_IMPORT_CONCURRENCY: usize = 4;

// ── Page limits ─────────────────────────────────────────────────────

/// The page sizes a table offers, plus the one it starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLimits {
    allowed: Vec<u32>,
    default: u32,
}

impl PageLimits {
    pub fn new(mut allowed: Vec<u32>, default: u32) -> Result<Self, CoreError> {
        allowed.sort_unstable();
        allowed.dedup();
        if allowed.is_empty() || allowed.first() == Some(&0) {
            return Err(CoreError::Config {
                message: "page sizes must be a non-empty list of positive numbers".into(),
            });
        }
        if !allowed.contains(&default) {
            return Err(CoreError::Config {
                message: format!("default page size {default} is not one of {allowed:?}"),
            });
        }
        Ok(Self { allowed, default })
    }

    pub fn allowed(&self) -> &[u32] {
        &self.allowed
    }

    pub fn default_limit(&self) -> u32 {
        self.default
    }

    pub fn contains(&self, limit: u32) -> bool {
        self.allowed.contains(&limit)
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_PAGE_SIZES.to_vec(),
            default: DEFAULT_PAGE_SIZE,
        }
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Behavioural tuning shared by every table session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub debounce: Duration,
    pub page_limits: PageLimits,
    pub import_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page_limits: PageLimits::default(),
            import_concurrency: DEFAULT_IMPORT_CONCURRENCY,
        }
    }
}

// ── Backend connection ──────────────────────────────────────────────

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

/// Where the REST backend lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub token: Option<SecretString>,
    pub timeout: Duration,
    pub tls: TlsVerification,
}

impl BackendConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(30),
            tls: TlsVerification::default(),
        }
    }

    pub(crate) fn transport(&self) -> gridline_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => gridline_api::TlsMode::System,
            TlsVerification::CustomCa(path) => gridline_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => gridline_api::TlsMode::DangerAcceptInvalid,
        };
        gridline_api::TransportConfig {
            tls,
            timeout: self.timeout,
            bearer_token: self.token.clone(),
        }
    }
}

// ── Collection ──────────────────────────────────────────────────────

/// Everything entity-specific about one collection.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub name: String,
    /// Plural, human-readable name used in footers and notifications.
    pub label: String,
    pub path: String,
    pub items_key: String,
    /// Declared row fields; empty means any field may be referenced.
    pub fields: Vec<String>,
    pub columns: Vec<ColumnConfig>,
    pub import: ImportMapping,
    pub export: ExportLayout,
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.replace(['-', '_'], " "),
            name,
            path: path.into(),
            items_key: "items".into(),
            fields: Vec::new(),
            columns: Vec::new(),
            import: ImportMapping::default(),
            export: ExportLayout::Inferred,
        }
    }

    pub fn schema(&self) -> RowSchema {
        if self.fields.is_empty() {
            RowSchema::open()
        } else {
            RowSchema::new(self.fields.iter().cloned())
        }
    }

    /// Build and validate the table described by `columns`.
    pub fn table_spec(&self) -> Result<TableSpec, CoreError> {
        let columns = self
            .columns
            .iter()
            .map(ColumnConfig::to_column)
            .collect::<Result<Vec<_>, _>>()?;
        TableSpec::new(columns, &self.schema())
    }
}
