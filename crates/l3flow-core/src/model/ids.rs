// ── Device and port identity ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

// ── DeviceId ────────────────────────────────────────────────────────

/// Opaque, stable controller identifier of a switch (e.g. `of:0000000000000001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── PortNumber ──────────────────────────────────────────────────────

/// A switch port, either physical or one of the OpenFlow logical ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortNumber {
    Physical(u32),
    Controller,
    Flood,
    Local,
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical(n) => write!(f, "{n}"),
            Self::Controller => f.write_str("CONTROLLER"),
            Self::Flood => f.write_str("FLOOD"),
            Self::Local => f.write_str("LOCAL"),
        }
    }
}

impl FromStr for PortNumber {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "CONTROLLER" => Ok(Self::Controller),
            "FLOOD" => Ok(Self::Flood),
            "LOCAL" => Ok(Self::Local),
            _ => trimmed
                .parse::<u32>()
                .map(Self::Physical)
                .map_err(|_| ParseError::Port(s.to_owned())),
        }
    }
}

impl From<u32> for PortNumber {
    fn from(n: u32) -> Self {
        Self::Physical(n)
    }
}
