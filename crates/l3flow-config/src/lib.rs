//! Configuration for the l3flow binary.
//!
//! TOML profiles, environment overlay, credential resolution (env +
//! keyring + plaintext), and translation to `l3flow_core::ControllerConfig`
//! and `l3flow_core::ReactiveConfig`. Core never reads files; this crate
//! is the only place that does.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use l3flow_core::{
    BasicCredentials, ControllerConfig, FallbackAction, ReactiveConfig, TlsVerification,
};

/// Environment prefix for config overrides and credentials.
pub const ENV_PREFIX: &str = "L3FLOW_";

/// Keyring service name.
const KEYRING_SERVICE: &str = "l3flow";

/// API root appended when a profile gives only `scheme://host:port`.
const DEFAULT_API_PATH: &str = "/onos/v1";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password found for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' is not defined")]
    UnknownProfile { name: String, available: String },

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    /// Sorted, comma-separated profile names, or `(none)`.
    pub fn profile_names(&self) -> String {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        if names.is_empty() {
            return "(none)".into();
        }
        names.sort_unstable();
        names.join(", ")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

/// A named controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller URL: either the API root (`http://host:8181/onos/v1`)
    /// or just `http://host:8181`.
    pub controller: String,

    /// Basic-auth user (stock controllers use `karaf`).
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    #[serde(default)]
    pub reactive: ReactiveSection,
}

/// `[profiles.<name>.reactive]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReactiveSection {
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
    /// Refresh the host cache every N poll cycles.
    pub refresh_every: u32,
    pub priority: u16,
    /// Idle timeout of reactive rules, seconds.
    pub flow_timeout: u32,
    /// `controller` or `flood`.
    pub fallback: String,
    /// Controller host address to keep reachable with a permanent rule.
    pub controller_ip: Option<String>,
    pub reachability_priority: u16,
}

impl Default for ReactiveSection {
    fn default() -> Self {
        let core = ReactiveConfig::default();
        Self {
            poll_interval_ms: millis(core.poll_interval),
            error_backoff_ms: millis(core.error_backoff),
            refresh_every: core.refresh_every,
            priority: core.priority,
            flow_timeout: core.flow_timeout_secs,
            fallback: core.fallback.to_string(),
            controller_ip: None,
            reachability_priority: core.reachability_priority,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "l3flow", "l3flow").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("l3flow");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from `path` (or the platform default) plus the environment.
///
/// An explicit path must exist; the default path may be absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::MissingFile {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password from the credential chain:
/// `password_env` → `L3FLOW_PASSWORD` → keyring → plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Global env var
    if let Some(pw) = env(&format!("{ENV_PREFIX}PASSWORD")) {
        return Ok(SecretString::from(pw));
    }

    // 3. Keyring
    if let Some(pw) = keyring(&format!("{profile_name}/password")) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Basic credentials for a profile, or `None` when no username is configured.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<BasicCredentials>, ConfigError> {
    let Some(username) = profile
        .username
        .clone()
        .or_else(|| std::env::var(format!("{ENV_PREFIX}USERNAME")).ok())
    else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some(BasicCredentials { username, password }))
}

// ── Translation to core config ──────────────────────────────────────

/// Parse a controller URL, defaulting the path to the versioned API root.
pub fn api_root(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| invalid("controller", format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "controller",
            format!("expected http or https, got '{}'", url.scheme()),
        ));
    }
    if url.path() == "/" || url.path().is_empty() {
        url.set_path(DEFAULT_API_PATH);
    }
    Ok(url)
}

/// Validate a `[reactive]` section into a `ReactiveConfig`.
pub fn reactive_config(section: &ReactiveSection) -> Result<ReactiveConfig, ConfigError> {
    if section.poll_interval_ms == 0 {
        return Err(invalid("reactive.poll_interval_ms", "must be greater than zero"));
    }
    if section.error_backoff_ms == 0 {
        return Err(invalid("reactive.error_backoff_ms", "must be greater than zero"));
    }
    if section.refresh_every == 0 {
        return Err(invalid("reactive.refresh_every", "must be at least one cycle"));
    }
    if section.flow_timeout == 0 {
        return Err(invalid(
            "reactive.flow_timeout",
            "reactive rules need a positive idle timeout",
        ));
    }

    let fallback: FallbackAction = section.fallback.parse().map_err(|_| {
        invalid(
            "reactive.fallback",
            format!("expected 'controller' or 'flood', got '{}'", section.fallback),
        )
    })?;

    let controller_ip = section
        .controller_ip
        .as_deref()
        .map(|raw| {
            raw.parse::<Ipv4Addr>()
                .map_err(|_| invalid("reactive.controller_ip", format!("not an IPv4 address: {raw}")))
        })
        .transpose()?;

    Ok(ReactiveConfig {
        poll_interval: Duration::from_millis(section.poll_interval_ms),
        error_backoff: Duration::from_millis(section.error_backoff_ms),
        refresh_every: section.refresh_every,
        priority: section.priority,
        flow_timeout_secs: section.flow_timeout,
        fallback,
        controller_ip,
        reachability_priority: section.reachability_priority,
    })
}

/// Build a `ControllerConfig` from a profile, with no CLI overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = api_root(&profile.controller)?;
    let credentials = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(invalid("timeout", "must be greater than zero"));
    }

    Ok(ControllerConfig {
        url,
        credentials,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}
