//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use gridline_config::ConfigError;
use gridline_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// Import finished but some records were rejected.
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("Could not reach the backend: {message}")]
    #[diagnostic(
        code(gridline::connection_failed),
        help(
            "Check base_url in your profile (or --base-url) and that the backend is up.\n\
             For self-signed certificates use --insecure (-k) or set ca_cert."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(gridline::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { message: String },

    #[error("Row '{identifier}' not found")]
    #[diagnostic(
        code(gridline::not_found),
        help("Run: gridline list {collection} to see available rows")
    )]
    NotFound {
        collection: String,
        identifier: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(gridline::conflict))]
    Conflict { message: String },

    #[error("Rejected by backend: {message}")]
    #[diagnostic(code(gridline::rejected))]
    Rejected {
        message: String,
        code: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(gridline::api_error))]
    Api { message: String },

    // ── Import ───────────────────────────────────────────────────────
    #[error("Could not read import file: {message}")]
    #[diagnostic(
        code(gridline::import_parse),
        help("Import files must be CSV or XLSX with a header row.")
    )]
    ImportParse { message: String },

    #[error("Imported {created} of {total} records, {rejected} rejected")]
    #[diagnostic(code(gridline::partial_import))]
    PartialImport {
        created: usize,
        rejected: usize,
        total: usize,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gridline::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gridline::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gridline config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(gridline::no_config),
        help(
            "Create a config with: gridline config init\n\
             Expected at: {path}\n\
             Or pass --base-url / set GRIDLINE_BASE_URL."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gridline::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(gridline::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(gridline::json), help("Payloads must be a single JSON object."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::PartialImport { .. } => exit_code::PARTIAL,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the collection name to a backend error for the help text.
    pub fn from_core(err: CoreError, collection: &str) -> Self {
        match err {
            CoreError::NotFound { identifier } => Self::NotFound {
                collection: collection.to_owned(),
                identifier,
            },
            other => other.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network {
                message,
                timed_out: true,
            } => CliError::Timeout { message },
            CoreError::Network { message, .. } => CliError::ConnectionFailed { message },

            CoreError::Validation {
                message,
                status: Some(409),
                ..
            } => CliError::Conflict { message },
            CoreError::Validation { message, code, .. } => CliError::Rejected { message, code },

            CoreError::NotFound { identifier } => CliError::NotFound {
                collection: "<collection>".into(),
                identifier,
            },

            CoreError::Parse { message } => CliError::ImportParse { message },

            CoreError::InvalidQuery { message } => CliError::Validation {
                field: "query".into(),
                reason: message,
            },
            CoreError::InvalidTable { message } => CliError::Validation {
                field: "columns".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            other @ (CoreError::Busy { .. } | CoreError::NothingToConfirm | CoreError::Internal(_)) => {
                CliError::Api {
                    message: other.to_string(),
                }
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}
