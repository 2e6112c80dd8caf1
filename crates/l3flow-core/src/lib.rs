//! Reactive L3 flow installation for an ONOS-style SDN controller.
//!
//! - **[`ReactiveLoop`]** polls packet-in events, resolves each destination
//!   through the [`HostLocationCache`], builds a rule with the
//!   [`FlowRuleSynthesizer`], and installs it unless the [`FlowStore`] says
//!   it is already in place.
//! - **[`ControllerClient`]** is the only way the loop reaches the
//!   controller. [`connect()`] builds the production client from a
//!   [`ControllerConfig`].
//! - **Domain model** ([`model`]) holds parsed devices, hosts, events and
//!   rules; [`convert`] is where wire strings become strong types.

pub mod cache;
pub mod clear;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod reactive;
pub mod stats;
pub mod store;
pub mod synth;

#[cfg(test)]
pub(crate) mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::HostLocationCache;
pub use clear::{ClearReport, clear_devices};
pub use client::{ControllerClient, connect};
pub use config::{
    BasicCredentials, ControllerConfig, FallbackAction, ReactiveConfig, TlsVerification,
};
pub use error::CoreError;
pub use reactive::{BatchReport, LoopState, ReactiveLoop, TickOutcome};
pub use stats::{LoopStats, StatsSnapshot};
pub use store::FlowStore;
pub use synth::FlowRuleSynthesizer;

pub use model::{
    Criterion, CriterionKind, Device, DeviceId, EtherType, FlowKey, FlowRule, Host, HostLocation,
    IpProtocol, Ipv4Cidr, PacketInEvent, PacketPayload, PortNumber, Selector, Treatment,
};
