// ── Core error types ──
//
// User-facing errors from gridline-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<gridline_api::Error>`
// impl classifies transport-layer errors into this taxonomy.
//
// A superseded fetch is not an error; it surfaces as `FetchOutcome::Stale`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    /// The backend could not be reached, timed out, or answered with a 5xx.
    #[error("Network failure: {message}")]
    Network { message: String, timed_out: bool },

    /// The backend rejected a payload (duplicate key, missing field, ...).
    #[error("{message}")]
    Validation {
        message: String,
        status: Option<u16>,
        code: Option<String>,
    },

    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    // ── Input errors ─────────────────────────────────────────────────
    /// An import file could not be read or parsed.
    #[error("Could not parse import file: {message}")]
    Parse { message: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Invalid table definition: {message}")]
    InvalidTable { message: String },

    // ── Action errors ────────────────────────────────────────────────
    /// Another action is awaiting confirmation or still submitting.
    #[error("Another action is in progress ({state})")]
    Busy { state: String },

    #[error("No action is awaiting confirmation")]
    NothingToConfirm,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short reason suitable for a notification or an import outcome line.
    pub fn reason(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gridline_api::Error> for CoreError {
    fn from(err: gridline_api::Error) -> Self {
        let timed_out = err.is_timeout();
        match err {
            gridline_api::Error::Transport(e) => CoreError::Network {
                message: e.to_string(),
                timed_out,
            },
            gridline_api::Error::Http {
                status,
                message,
                code,
            } => classify_status(status, message, code),
            gridline_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gridline_api::Error::InvalidToken(reason) => CoreError::Config {
                message: format!("Invalid bearer token: {reason}"),
            },
            gridline_api::Error::Tls(msg) => CoreError::Network {
                message: format!("TLS error: {msg}"),
                timed_out: false,
            },
            gridline_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            gridline_api::Error::Envelope(message) => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
        }
    }
}

fn classify_status(status: u16, message: String, code: Option<String>) -> CoreError {
    match status {
        404 => CoreError::NotFound {
            identifier: message,
        },
        400..=499 => CoreError::Validation {
            message,
            status: Some(status),
            code,
        },
        _ => CoreError::Network {
            message: format!("HTTP {status}: {message}"),
            timed_out: false,
        },
    }
}
