// ── Domain model ──
//
// Canonical types for the reactive loop. Everything here is parsed and
// validated; raw controller strings stop at `convert`.

pub mod device;
pub mod flow;
pub mod host;
pub mod ids;
pub mod net;
pub mod packet;

use thiserror::Error;

pub use device::Device;
pub use flow::{
    Criterion, CriterionKind, FlowKey, FlowRule, Instruction, Selector, Treatment,
};
pub use host::{Host, HostLocation};
pub use ids::{DeviceId, PortNumber};
pub use net::{EtherType, IpProtocol, Ipv4Cidr};
pub use packet::{PacketInEvent, PacketPayload};

/// A controller string that does not parse into a model type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid port: {0:?}")]
    Port(String),
    #[error("invalid IPv4 address: {0:?}")]
    Address(String),
    #[error("invalid IPv4 prefix: {0:?}")]
    Cidr(String),
    #[error("unsupported IP protocol number {0}")]
    Protocol(u8),
    #[error("IP protocol number out of range: {0}")]
    ProtocolRange(i64),
}
