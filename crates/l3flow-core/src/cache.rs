// ── Host location cache ──
//
// Answers "which port on this device reaches that IP" from the last host
// inventory snapshot. Refresh builds a complete snapshot off to the side
// and swaps it in one store, so a lookup sees either the old or the new
// inventory and never a mix.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::client::ControllerClient;
use crate::error::CoreError;
use crate::model::{DeviceId, Host, PortNumber};

#[derive(Debug, Default)]
struct Snapshot {
    /// Resolvable hosts in inventory order.
    hosts: Vec<Host>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// IP → (device, port) lookup over the controller's host inventory.
///
/// Only direct attachment is resolved: the destination must hang off the
/// same device that reported the packet. Hosts with no location are
/// excluded. When several hosts share an IP, the first in inventory order
/// wins.
#[derive(Debug, Default)]
pub struct HostLocationCache {
    snapshot: ArcSwap<Snapshot>,
}

impl HostLocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port on `origin` that reaches `dst`, if a cached host is attached there.
    pub fn resolve(&self, dst: Ipv4Addr, origin: &DeviceId) -> Option<PortNumber> {
        let ip = IpAddr::V4(dst);
        let snap = self.snapshot.load();
        snap.hosts
            .iter()
            .filter(|h| h.has_ip(ip))
            .find_map(|h| h.location_on(origin))
            .map(|loc| loc.port)
    }

    /// Replace the cache from a fresh host inventory.
    ///
    /// On error the previous snapshot stays in place.
    pub async fn refresh<C: ControllerClient>(&self, client: &C) -> Result<usize, CoreError> {
        let hosts = client.list_hosts().await?;
        Ok(self.replace(hosts))
    }

    /// Swap in a snapshot built from `hosts`. Returns the number kept.
    pub fn replace(&self, hosts: Vec<Host>) -> usize {
        let total = hosts.len();
        let hosts: Vec<Host> = hosts.into_iter().filter(Host::is_resolvable).collect();
        let kept = hosts.len();
        if kept < total {
            debug!(excluded = total - kept, "hosts without address or location");
        }

        self.snapshot.store(Arc::new(Snapshot {
            hosts,
            refreshed_at: Some(Utc::now()),
        }));
        info!(hosts = kept, "host location cache refreshed");
        kept
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.snapshot.store(Arc::new(Snapshot::default()));
    }

    /// Number of resolvable hosts cached.
    pub fn len(&self) -> usize {
        self.snapshot.load().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.load().refreshed_at
    }
}
