// ── Flow rule synthesis ──
//
// Pure construction of rules from packet-in events. No I/O and no state
// beyond the policy knobs fixed at construction.

use std::net::Ipv4Addr;

use crate::config::{FallbackAction, ReactiveConfig};
use crate::error::CoreError;
use crate::model::{
    Criterion, DeviceId, EtherType, FlowRule, IpProtocol, Ipv4Cidr, PacketInEvent, PacketPayload,
    PortNumber, Selector, Treatment,
};

/// Builds reactive and reachability rules under a fixed policy.
#[derive(Debug, Clone)]
pub struct FlowRuleSynthesizer {
    priority: u16,
    timeout_secs: u32,
    fallback: FallbackAction,
    reachability_priority: u16,
}

impl FlowRuleSynthesizer {
    pub fn new(priority: u16, timeout_secs: u32, fallback: FallbackAction) -> Result<Self, CoreError> {
        if timeout_secs == 0 {
            return Err(CoreError::Config {
                message: "reactive flow timeout must be greater than zero".into(),
            });
        }
        Ok(Self {
            priority,
            timeout_secs,
            fallback,
            reachability_priority: ReactiveConfig::DEFAULT_REACHABILITY_PRIORITY,
        })
    }

    pub fn from_config(config: &ReactiveConfig) -> Result<Self, CoreError> {
        let mut synth = Self::new(config.priority, config.flow_timeout_secs, config.fallback)?;
        synth.reachability_priority = config.reachability_priority;
        Ok(synth)
    }

    pub fn fallback(&self) -> FallbackAction {
        self.fallback
    }

    /// Reactive rule for `event`.
    ///
    /// `egress` is the resolved port, or `None` to use the fallback action.
    /// Returns `Ok(None)` for non-IPv4 payloads and unsupported protocols.
    pub fn build(
        &self,
        event: &PacketInEvent,
        egress: Option<PortNumber>,
    ) -> Result<Option<FlowRule>, CoreError> {
        let PacketPayload::Ipv4 { src, dst, protocol } = event.payload else {
            return Ok(None);
        };
        let Ok(protocol) = IpProtocol::try_from(protocol) else {
            return Ok(None);
        };

        let selector = Selector::new()
            .with(Criterion::InPort(event.in_port))
            .with(Criterion::EthType(EtherType::IPV4))
            .with(Criterion::Ipv4Src(Ipv4Cidr::host(src)))
            .with(Criterion::Ipv4Dst(Ipv4Cidr::host(dst)))
            .with(Criterion::IpProto(protocol.number()));
        let treatment = Treatment::output(egress.unwrap_or_else(|| self.fallback.port()));

        FlowRule::temporary(
            event.device_id.clone(),
            self.priority,
            self.timeout_secs,
            selector,
            treatment,
        )
        .map(Some)
    }

    /// Permanent rule steering traffic for the controller out of `port`.
    pub fn reachability(&self, device: DeviceId, controller_ip: Ipv4Addr, port: PortNumber) -> FlowRule {
        let selector = Selector::new()
            .with(Criterion::EthType(EtherType::IPV4))
            .with(Criterion::Ipv4Dst(Ipv4Cidr::host(controller_ip)));
        FlowRule::permanent(
            device,
            self.reachability_priority,
            selector,
            Treatment::output(port),
        )
    }
}
