// ── Installed-flow bookkeeping ──
//
// Best-effort record of which rules each device is believed to hold.
// The controller expires reactive rules on its own, so records carry an
// expiry and stop suppressing installs once it passes.

mod record;

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::model::{DeviceId, FlowKey, FlowRule};

pub use record::InstalledRecord;

/// Per-device set of rules known to be installed.
#[derive(Debug, Default)]
pub struct FlowStore {
    devices: DashMap<DeviceId, HashMap<FlowKey, InstalledRecord>>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `rule` needs to go to the controller.
    ///
    /// True when nothing is recorded for its match, the record has expired,
    /// or the recorded egress differs.
    pub fn should_install(&self, rule: &FlowRule) -> bool {
        let Some(records) = self.devices.get(rule.device_id()) else {
            return true;
        };
        match records.get(&rule.key()) {
            Some(record) => {
                record.is_expired(Instant::now()) || record.egress != rule.treatment().egress()
            }
            None => true,
        }
    }

    /// Remember a successful install.
    pub fn record(&self, rule: &FlowRule) {
        let expires_at = (!rule.is_permanent())
            .then(|| Instant::now() + Duration::from_secs(u64::from(rule.timeout_secs())));
        self.devices.entry(rule.device_id().clone()).or_default().insert(
            rule.key(),
            InstalledRecord {
                egress: rule.treatment().egress(),
                priority: rule.priority(),
                expires_at,
            },
        );
    }

    pub fn contains(&self, device: &DeviceId, key: &FlowKey) -> bool {
        self.devices
            .get(device)
            .is_some_and(|records| records.contains_key(key))
    }

    /// Drop all records for one device. Returns how many were dropped.
    pub fn clear(&self, device: &DeviceId) -> usize {
        self.devices
            .remove(device)
            .map_or(0, |(_, records)| records.len())
    }

    pub fn clear_all(&self) {
        self.devices.clear();
    }

    /// Drop records whose expiry has passed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        self.devices.retain(|_, records| {
            let before = records.len();
            records.retain(|_, r| !r.is_expired(now));
            purged += before - records.len();
            !records.is_empty()
        });
        purged
    }

    /// Records held for one device.
    pub fn len_for(&self, device: &DeviceId) -> usize {
        self.devices.get(device).map_or(0, |records| records.len())
    }

    pub fn len(&self) -> usize {
        self.devices.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
