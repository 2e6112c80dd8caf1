// ── Host domain types ──

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, PortNumber};

/// A (device, port) attachment point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostLocation {
    pub device_id: DeviceId,
    #[serde(with = "port_text")]
    pub port: PortNumber,
}

impl HostLocation {
    pub fn new(device_id: impl Into<DeviceId>, port: PortNumber) -> Self {
        Self {
            device_id: device_id.into(),
            port,
        }
    }
}

/// An end host as observed by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    pub mac: String,
    pub vlan: Option<String>,
    pub inner_vlan: Option<String>,
    pub outer_tpid: Option<String>,
    pub configured: bool,
    pub suspended: bool,
    pub ip_addresses: Vec<IpAddr>,
    /// Attachment points in controller order.
    pub locations: Vec<HostLocation>,
}

impl Host {
    /// Whether the cache can ever answer for this host.
    pub fn is_resolvable(&self) -> bool {
        !self.ip_addresses.is_empty() && !self.locations.is_empty()
    }

    pub fn has_ip(&self, ip: IpAddr) -> bool {
        self.ip_addresses.contains(&ip)
    }

    /// First location on `device`, if the host is attached there.
    pub fn location_on(&self, device: &DeviceId) -> Option<&HostLocation> {
        self.locations.iter().find(|l| &l.device_id == device)
    }
}

mod port_text {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::model::ids::PortNumber;

    pub(super) fn serialize<S: Serializer>(port: &PortNumber, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(port)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<PortNumber, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    fn host(locations: Vec<HostLocation>) -> Host {
        Host {
            id: "AE:96:D1:27:79:73/None".into(),
            mac: "AE:96:D1:27:79:73".into(),
            vlan: None,
            inner_vlan: None,
            outer_tpid: None,
            configured: false,
            suspended: false,
            ip_addresses: vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))],
            locations,
        }
    }

    #[test]
    fn location_on_matches_device_not_position() {
        let h = host(vec![
            HostLocation::new("of:01", PortNumber::Physical(5)),
            HostLocation::new("of:02", PortNumber::Physical(9)),
        ]);

        let on_second = h.location_on(&"of:02".into()).map(|l| l.port);
        assert_eq!(on_second, Some(PortNumber::Physical(9)));
        assert!(h.location_on(&"of:03".into()).is_none());
    }

    #[test]
    fn host_without_location_is_unresolvable() {
        assert!(!host(Vec::new()).is_resolvable());
        assert!(host(vec![HostLocation::new("of:01", PortNumber::Physical(1))]).is_resolvable());
    }
}
