// ── Core error types ──
//
// Domain-level failures of the reactive loop. Consumers never match on
// HTTP details; `From<l3flow_api::Error>` folds transport errors into
// the variants below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller call timed out")]
    Timeout,

    // ── Controller responses ─────────────────────────────────────────
    #[error("Controller error: {message}")]
    Api {
        message: String,
        /// HTTP status code, when the controller answered.
        status: Option<u16>,
    },

    // ── Rule errors ──────────────────────────────────────────────────
    #[error("Invalid flow rule: {message}")]
    InvalidFlowRule { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Worth retrying on the next cycle without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => true,
            Self::Api { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<l3flow_api::Error> for CoreError {
    fn from(err: l3flow_api::Error) -> Self {
        match err {
            l3flow_api::Error::Authentication { status } => CoreError::AuthenticationFailed {
                message: format!("controller rejected credentials (HTTP {status})"),
            },
            l3flow_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            l3flow_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            l3flow_api::Error::UnusableBaseUrl(url) => CoreError::Config {
                message: format!("URL cannot be used as an API root: {url}"),
            },
            l3flow_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            l3flow_api::Error::Status { status, url, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status} from {url}")
                } else {
                    format!("HTTP {status} from {url}: {body}")
                },
                status: Some(status),
            },
            l3flow_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
