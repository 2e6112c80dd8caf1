//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use l3flow_config::ConfigError;
use l3flow_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(l3flow::connection_failed),
        help(
            "Check that the controller is running and its REST API is reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out")]
    #[diagnostic(
        code(l3flow::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(l3flow::auth_failed),
        help("Check --username and L3FLOW_PASSWORD, or the credentials of the active profile.")
    )]
    AuthFailed { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(l3flow::no_credentials),
        help(
            "Set L3FLOW_PASSWORD, point password_env at a variable,\n\
             or store it in the keyring under '{profile}/password'."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("Controller error: {message}")]
    #[diagnostic(code(l3flow::api_error))]
    Api { message: String },

    #[error("Failed to clear {failed} of {attempted} device(s): {devices}")]
    #[diagnostic(
        code(l3flow::partial_clear),
        help("Rerun with --device for the listed devices once they are reachable.")
    )]
    PartialClear {
        failed: usize,
        attempted: usize,
        devices: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(l3flow::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(l3flow::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(l3flow::no_config),
        help(
            "Pass --controller, or add a profile to {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(l3flow::missing_config))]
    MissingConfig { path: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(code(l3flow::config))]
    Config { message: String },

    // ── Serialization ────────────────────────────────────────────────

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(l3flow::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Api { message, status: _ } | CoreError::Internal(message) => {
                CliError::Api { message }
            }

            CoreError::InvalidFlowRule { message } => CliError::Validation {
                field: "flow rule".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::MissingFile { path } => CliError::MissingConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(e) => CliError::Config {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let conn: CliError = CoreError::ConnectionFailed {
            url: "http://10.0.0.1:8181/onos/v1".into(),
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);

        let auth: CliError = CoreError::AuthenticationFailed {
            message: "HTTP 401".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);

        let invalid: CliError = ConfigError::Validation {
            field: "reactive.fallback".into(),
            reason: "expected 'controller' or 'flood'".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        let api: CliError = CoreError::Api {
            message: "HTTP 500".into(),
            status: Some(500),
        }
        .into();
        assert_eq!(api.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn unknown_profile_keeps_available_names() {
        let err: CliError = ConfigError::UnknownProfile {
            name: "prod".into(),
            available: "lab, staging".into(),
        }
        .into();

        assert!(
            matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "lab, staging"),
            "got {err:?}"
        );
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
