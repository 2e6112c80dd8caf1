// ── Runtime configuration ──
//
// These types describe how to reach the controller and how the reactive
// loop behaves. They never touch disk: the CLI builds them from a profile
// and hands them in.

use std::net::Ipv4Addr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::model::PortNumber;

/// HTTP basic credentials.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// How to reach a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Versioned API root, e.g. `http://192.168.71.10:8181/onos/v1`.
    pub url: Url,
    pub credentials: Option<BasicCredentials>,
    pub tls: TlsVerification,
    /// Per-call deadline.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// What a rule does with traffic whose destination is unresolved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FallbackAction {
    /// Punt to the controller.
    #[default]
    Controller,
    /// Flood out every port.
    Flood,
}

impl FallbackAction {
    pub fn port(self) -> PortNumber {
        match self {
            Self::Controller => PortNumber::Controller,
            Self::Flood => PortNumber::Flood,
        }
    }
}

/// Reactive loop tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactiveConfig {
    /// Pause between successful poll cycles.
    pub poll_interval: Duration,
    /// Pause after a failed poll.
    pub error_backoff: Duration,
    /// Refresh the host cache every N cycles.
    pub refresh_every: u32,
    pub priority: u16,
    pub flow_timeout_secs: u32,
    pub fallback: FallbackAction,
    /// When set, every device the controller host is attached to gets a
    /// permanent rule toward it.
    pub controller_ip: Option<Ipv4Addr>,
    pub reachability_priority: u16,
}

impl ReactiveConfig {
    pub const DEFAULT_PRIORITY: u16 = 4000;
    pub const DEFAULT_FLOW_TIMEOUT_SECS: u32 = 30;
    pub const DEFAULT_REACHABILITY_PRIORITY: u16 = 10000;
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(2),
            refresh_every: 10,
            priority: Self::DEFAULT_PRIORITY,
            flow_timeout_secs: Self::DEFAULT_FLOW_TIMEOUT_SECS,
            fallback: FallbackAction::Controller,
            controller_ip: None,
            reachability_priority: Self::DEFAULT_REACHABILITY_PRIORITY,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fallback_parses_case_insensitively() {
        assert_eq!("FLOOD".parse::<FallbackAction>().unwrap(), FallbackAction::Flood);
        assert_eq!(
            "controller".parse::<FallbackAction>().unwrap(),
            FallbackAction::Controller
        );
        assert!("drop".parse::<FallbackAction>().is_err());
    }

    #[test]
    fn defaults_match_reactive_tier() {
        let cfg = ReactiveConfig::default();
        assert_eq!(cfg.priority, 4000);
        assert_eq!(cfg.flow_timeout_secs, 30);
        assert_eq!(cfg.fallback.port(), PortNumber::Controller);
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.error_backoff, Duration::from_secs(2));
    }
}
