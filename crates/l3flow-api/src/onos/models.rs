// ONOS REST wire types
//
// Models for the controller's JSON API. List endpoints wrap their payload
// in a single-key envelope. Fields use `#[serde(default)]` liberally because
// controller versions and drivers disagree about which fields are present.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

// ── Envelopes ────────────────────────────────────────────────────────

/// `GET /devices` → `{ "devices": [...] }`
#[derive(Debug, Deserialize)]
pub struct DevicesEnvelope {
    #[serde(default)]
    pub devices: Vec<DeviceResponse>,
}

/// `GET /hosts` → `{ "hosts": [...] }`
#[derive(Debug, Deserialize)]
pub struct HostsEnvelope {
    #[serde(default)]
    pub hosts: Vec<HostResponse>,
}

/// `GET /packets` → `{ "packets": [...] }`
///
/// Entries are decoded one by one; an entry that does not fit
/// `PacketResponse` is dropped instead of failing the whole poll.
#[derive(Debug, Deserialize)]
pub struct PacketsEnvelope {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub packets: Vec<PacketResponse>,
}

fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|entry| {
            serde_json::from_value(entry)
                .inspect_err(|e| debug!(error = %e, "dropping malformed list entry"))
                .ok()
        })
        .collect())
}

// ── Device ───────────────────────────────────────────────────────────

/// Infrastructure device (switch) from `GET /devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub mfr: Option<String>,
    #[serde(default)]
    pub hw: Option<String>,
    #[serde(default)]
    pub sw: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub chassis_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number_opt")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub human_readable_last_update: Option<String>,
    #[serde(default)]
    pub annotations: DeviceAnnotations,
}

/// Free-form device annotations; the three we care about are modelled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAnnotations {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub management_address: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    /// Catch-all for driver-specific annotations.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Host ─────────────────────────────────────────────────────────────

/// End host from `GET /hosts`.
///
/// ```json
/// {"id": "AE:96:D1:27:79:73/None", "mac": "AE:96:D1:27:79:73", "vlan": "None",
///  "ipAddresses": ["192.168.71.138"],
///  "locations": [{"elementId": "of:0000000000000001", "port": "4"}]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostResponse {
    pub id: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub vlan: Option<String>,
    #[serde(default)]
    pub inner_vlan: Option<String>,
    #[serde(default)]
    pub outer_tpid: Option<String>,
    #[serde(default)]
    pub configured: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub locations: Vec<LocationResponse>,
}

/// A (device, port) attachment point of a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub element_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
}

// ── Packet-in ────────────────────────────────────────────────────────

/// A packet punted to the controller, from `GET /packets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketResponse {
    pub device_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    /// Absent for anything that did not parse as IPv4.
    #[serde(default)]
    pub ipv4_packet: Option<Ipv4PacketResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ipv4PacketResponse {
    pub source: String,
    pub destination: String,
    /// IP protocol number. Some controllers emit it as a signed byte,
    /// so SCTP (132) can arrive as -124.
    #[serde(default)]
    pub protocol: Option<i64>,
}

// ── Flow rule request ────────────────────────────────────────────────

/// Body of `POST /flows/{deviceId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRuleRequest {
    pub priority: u16,
    pub timeout: u32,
    pub is_permanent: bool,
    pub device_id: String,
    pub treatment: TreatmentBody,
    pub selector: SelectorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentBody {
    pub instructions: Vec<InstructionBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorBody {
    pub criteria: Vec<CriterionBody>,
}

/// Treatment instruction. Ports are strings: a number, `CONTROLLER`, or `FLOOD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstructionBody {
    Output { port: String },
}

/// Selector criterion, tagged by its ONOS criterion type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionBody {
    InPort {
        port: String,
    },
    EthType {
        #[serde(rename = "ethType")]
        eth_type: String,
    },
    EthDst {
        mac: String,
    },
    #[serde(rename = "IPV4_SRC")]
    Ipv4Src {
        ip: String,
    },
    #[serde(rename = "IPV4_DST")]
    Ipv4Dst {
        ip: String,
    },
    IpProto {
        protocol: u8,
    },
    UdpDst {
        #[serde(rename = "udpPort")]
        udp_port: u16,
    },
    TunnelId {
        #[serde(rename = "tunnelId")]
        tunnel_id: u64,
    },
}

/// Result of a successful `POST /flows/{deviceId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowInstallAck {
    pub status: u16,
    /// `Location` header pointing at the created flow, when the controller sends one.
    pub location: Option<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Ports and timestamps show up as either `"4"` or `4` depending on the endpoint.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(StringOrNumber::into_string)
}

fn string_or_number_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(StringOrNumber::into_string))
}
