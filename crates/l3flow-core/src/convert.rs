// ── API-to-domain conversions ──
//
// Bridges raw `l3flow_api` wire types and `l3flow_core::model` domain
// types. Inbound conversions parse strings into strong types and drop
// entries that do not parse; outbound conversion renders a `FlowRule` in
// the controller's criterion vocabulary.

use std::net::{IpAddr, Ipv4Addr};

use chrono::{DateTime, Utc};
use tracing::debug;

use l3flow_api::onos::models::{
    CriterionBody, DeviceResponse, FlowRuleRequest, HostResponse, InstructionBody,
    PacketResponse, SelectorBody, TreatmentBody,
};

use crate::model::{
    Criterion, Device, FlowRule, Host, HostLocation, Instruction, PacketInEvent, PacketPayload,
    ParseError, PortNumber,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Controller timestamps are epoch milliseconds rendered as text.
fn parse_epoch_millis(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

fn parse_ipv4(raw: &str) -> Result<Ipv4Addr, ParseError> {
    raw.trim()
        .parse()
        .map_err(|_| ParseError::Address(raw.to_owned()))
}

// ── Device ─────────────────────────────────────────────────────────

impl From<DeviceResponse> for Device {
    fn from(d: DeviceResponse) -> Self {
        Self {
            id: d.id.into(),
            device_type: d.device_type,
            available: d.available,
            role: d.role,
            manufacturer: d.mfr,
            hardware: d.hw,
            software: d.sw,
            serial: d.serial,
            driver: d.driver,
            management_address: d.annotations.management_address,
            protocol: d.annotations.protocol,
            last_update: parse_epoch_millis(d.last_update.as_ref()),
        }
    }
}

// ── Host ───────────────────────────────────────────────────────────

impl From<HostResponse> for Host {
    fn from(h: HostResponse) -> Self {
        let ip_addresses = h
            .ip_addresses
            .iter()
            .filter_map(|raw| match raw.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    debug!(host = %h.id, address = %raw, "dropping unparseable host address");
                    None
                }
            })
            .collect();

        let locations = h
            .locations
            .iter()
            .filter_map(|loc| match loc.port.parse::<PortNumber>() {
                Ok(port) => Some(HostLocation::new(loc.element_id.as_str(), port)),
                Err(e) => {
                    debug!(host = %h.id, device = %loc.element_id, error = %e, "dropping host location");
                    None
                }
            })
            .collect();

        Self {
            id: h.id,
            mac: h.mac,
            vlan: h.vlan,
            inner_vlan: h.inner_vlan,
            outer_tpid: h.outer_tpid,
            configured: h.configured,
            suspended: h.suspended,
            ip_addresses,
            locations,
        }
    }
}

// ── Packet-in ──────────────────────────────────────────────────────

/// Protocol numbers arrive either unsigned or as a signed byte.
fn protocol_number(raw: i64) -> Result<u8, ParseError> {
    u8::try_from(raw)
        .or_else(|_| i8::try_from(raw).map(|b| u8::from_ne_bytes(b.to_ne_bytes())))
        .map_err(|_| ParseError::ProtocolRange(raw))
}

impl TryFrom<PacketResponse> for PacketInEvent {
    type Error = ParseError;

    fn try_from(p: PacketResponse) -> Result<Self, Self::Error> {
        let in_port = p.port.parse::<PortNumber>()?;

        // No protocol means the controller could not parse past the IP
        // header; treat it like any other non-IPv4 punt.
        let payload = match p.ipv4_packet {
            Some(ip) => match ip.protocol {
                Some(protocol) => PacketPayload::Ipv4 {
                    src: parse_ipv4(&ip.source)?,
                    dst: parse_ipv4(&ip.destination)?,
                    protocol: protocol_number(protocol)?,
                },
                None => PacketPayload::NonIpv4,
            },
            None => PacketPayload::NonIpv4,
        };

        Ok(Self {
            device_id: p.device_id.into(),
            in_port,
            payload,
        })
    }
}

/// Convert a poll batch, keeping controller order and dropping malformed entries.
pub fn packet_events(raw: Vec<PacketResponse>) -> Vec<PacketInEvent> {
    raw.into_iter()
        .filter_map(|p| {
            let device = p.device_id.clone();
            PacketInEvent::try_from(p)
                .inspect_err(|e| debug!(device = %device, error = %e, "dropping malformed packet-in"))
                .ok()
        })
        .collect()
}

// ── Flow rule ──────────────────────────────────────────────────────

impl From<&Criterion> for CriterionBody {
    fn from(c: &Criterion) -> Self {
        match c {
            Criterion::InPort(port) => Self::InPort {
                port: port.to_string(),
            },
            Criterion::EthType(eth) => Self::EthType {
                eth_type: eth.to_string(),
            },
            Criterion::EthDst(mac) => Self::EthDst { mac: mac.clone() },
            Criterion::Ipv4Src(cidr) => Self::Ipv4Src {
                ip: cidr.to_string(),
            },
            Criterion::Ipv4Dst(cidr) => Self::Ipv4Dst {
                ip: cidr.to_string(),
            },
            Criterion::IpProto(protocol) => Self::IpProto {
                protocol: *protocol,
            },
            Criterion::UdpDst(udp_port) => Self::UdpDst {
                udp_port: *udp_port,
            },
            Criterion::TunnelId(tunnel_id) => Self::TunnelId {
                tunnel_id: *tunnel_id,
            },
        }
    }
}

impl From<&FlowRule> for FlowRuleRequest {
    fn from(rule: &FlowRule) -> Self {
        Self {
            priority: rule.priority(),
            timeout: rule.timeout_secs(),
            is_permanent: rule.is_permanent(),
            device_id: rule.device_id().to_string(),
            treatment: TreatmentBody {
                instructions: rule
                    .treatment()
                    .instructions()
                    .iter()
                    .map(|Instruction::Output(port)| InstructionBody::Output {
                        port: port.to_string(),
                    })
                    .collect(),
            },
            selector: SelectorBody {
                criteria: rule
                    .selector()
                    .criteria()
                    .iter()
                    .map(CriterionBody::from)
                    .collect(),
            },
        }
    }
}
