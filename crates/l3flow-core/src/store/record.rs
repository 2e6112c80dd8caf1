use tokio::time::Instant;

use crate::model::PortNumber;

/// What was installed for one match on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledRecord {
    pub egress: Option<PortNumber>,
    pub priority: u16,
    /// `None` for permanent rules.
    pub expires_at: Option<Instant>,
}

impl InstalledRecord {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}
