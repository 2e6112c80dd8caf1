// ── Packet-in events ──

use std::net::Ipv4Addr;

use super::ids::{DeviceId, PortNumber};

/// What the controller parsed out of a punted packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketPayload {
    Ipv4 {
        src: Ipv4Addr,
        dst: Ipv4Addr,
        protocol: u8,
    },
    NonIpv4,
}

/// A packet a switch sent to the controller for a forwarding decision.
///
/// Consumed once by the poll cycle that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketInEvent {
    pub device_id: DeviceId,
    pub in_port: PortNumber,
    pub payload: PacketPayload,
}

impl PacketInEvent {
    pub fn ipv4(
        device_id: impl Into<DeviceId>,
        in_port: u32,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        protocol: u8,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            in_port: PortNumber::Physical(in_port),
            payload: PacketPayload::Ipv4 { src, dst, protocol },
        }
    }
}
