// ── Device domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::DeviceId;

/// A switch known to the controller.
///
/// Replaced wholesale on every inventory refresh; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_type: Option<String>,
    pub available: bool,
    pub role: Option<String>,
    pub manufacturer: Option<String>,
    pub hardware: Option<String>,
    pub software: Option<String>,
    pub serial: Option<String>,
    pub driver: Option<String>,
    pub management_address: Option<String>,
    /// Southbound protocol, e.g. `OF_13`.
    pub protocol: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Device {
    /// A bare device record carrying only its id.
    pub fn with_id(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            device_type: None,
            available: true,
            role: None,
            manufacturer: None,
            hardware: None,
            software: None,
            serial: None,
            driver: None,
            management_address: None,
            protocol: None,
            last_update: None,
        }
    }
}
