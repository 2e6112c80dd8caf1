// ── Flow rules ──
//
// A rule is a selector (match criteria), a treatment (egress), and
// lifetime policy. Criteria are addressed by kind, never by position.

use strum::{Display, EnumIter, IntoEnumIterator};

use super::ids::{DeviceId, PortNumber};
use super::net::{EtherType, Ipv4Cidr};
use crate::error::CoreError;

// ── Criteria ────────────────────────────────────────────────────────

/// Criterion type tags, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionKind {
    InPort,
    EthType,
    EthDst,
    #[strum(serialize = "IPV4_SRC")]
    Ipv4Src,
    #[strum(serialize = "IPV4_DST")]
    Ipv4Dst,
    IpProto,
    UdpDst,
    TunnelId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Criterion {
    InPort(PortNumber),
    EthType(EtherType),
    EthDst(String),
    Ipv4Src(Ipv4Cidr),
    Ipv4Dst(Ipv4Cidr),
    IpProto(u8),
    UdpDst(u16),
    TunnelId(u64),
}

impl Criterion {
    pub fn kind(&self) -> CriterionKind {
        match self {
            Self::InPort(_) => CriterionKind::InPort,
            Self::EthType(_) => CriterionKind::EthType,
            Self::EthDst(_) => CriterionKind::EthDst,
            Self::Ipv4Src(_) => CriterionKind::Ipv4Src,
            Self::Ipv4Dst(_) => CriterionKind::Ipv4Dst,
            Self::IpProto(_) => CriterionKind::IpProto,
            Self::UdpDst(_) => CriterionKind::UdpDst,
            Self::TunnelId(_) => CriterionKind::TunnelId,
        }
    }
}

/// Ordered match criteria, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    criteria: Vec<Criterion>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a criterion, replacing any existing one of the same kind in place.
    #[must_use]
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        let kind = criterion.kind();
        match self.criteria.iter_mut().find(|c| c.kind() == kind) {
            Some(existing) => *existing = criterion,
            None => self.criteria.push(criterion),
        }
    }

    pub fn get(&self, kind: CriterionKind) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.kind() == kind)
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn in_port(&self) -> Option<PortNumber> {
        match self.get(CriterionKind::InPort) {
            Some(Criterion::InPort(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn ipv4_dst(&self) -> Option<Ipv4Cidr> {
        match self.get(CriterionKind::Ipv4Dst) {
            Some(Criterion::Ipv4Dst(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn ip_proto(&self) -> Option<u8> {
        match self.get(CriterionKind::IpProto) {
            Some(Criterion::IpProto(p)) => Some(*p),
            _ => None,
        }
    }
}

/// Identity of a rule's match for de-duplication.
///
/// Built by walking criterion kinds in canonical order, so two selectors
/// with the same criteria in a different order produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowKey(Vec<Criterion>);

impl FlowKey {
    pub fn from_selector(selector: &Selector) -> Self {
        Self(
            CriterionKind::iter()
                .filter_map(|kind| selector.get(kind).cloned())
                .collect(),
        )
    }
}

// ── Treatment ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Output(PortNumber),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treatment {
    instructions: Vec<Instruction>,
}

impl Treatment {
    pub fn output(port: PortNumber) -> Self {
        Self {
            instructions: vec![Instruction::Output(port)],
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Port of the first output instruction.
    pub fn egress(&self) -> Option<PortNumber> {
        self.instructions.iter().map(|Instruction::Output(p)| *p).next()
    }
}

// ── FlowRule ────────────────────────────────────────────────────────

/// A match-action entry destined for one device.
///
/// Permanent rules always carry timeout 0 and temporary rules a positive
/// timeout. The constructors enforce this; there is no other way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRule {
    device_id: DeviceId,
    priority: u16,
    timeout_secs: u32,
    permanent: bool,
    selector: Selector,
    treatment: Treatment,
}

impl FlowRule {
    /// A rule the controller expires after `timeout_secs` of idleness.
    pub fn temporary(
        device_id: DeviceId,
        priority: u16,
        timeout_secs: u32,
        selector: Selector,
        treatment: Treatment,
    ) -> Result<Self, CoreError> {
        let rule = Self {
            device_id,
            priority,
            timeout_secs,
            permanent: false,
            selector,
            treatment,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// A rule that never expires.
    pub fn permanent(
        device_id: DeviceId,
        priority: u16,
        selector: Selector,
        treatment: Treatment,
    ) -> Self {
        Self {
            device_id,
            priority,
            timeout_secs: 0,
            permanent: true,
            selector,
            treatment,
        }
    }

    /// Check the permanence/timeout pairing and that the rule has an egress.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.permanent && self.timeout_secs != 0 {
            return Err(CoreError::InvalidFlowRule {
                message: format!(
                    "permanent rule on {} has timeout {}",
                    self.device_id, self.timeout_secs
                ),
            });
        }
        if !self.permanent && self.timeout_secs == 0 {
            return Err(CoreError::InvalidFlowRule {
                message: format!("temporary rule on {} has timeout 0", self.device_id),
            });
        }
        if self.treatment.egress().is_none() {
            return Err(CoreError::InvalidFlowRule {
                message: format!("rule on {} has no output instruction", self.device_id),
            });
        }
        Ok(())
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn treatment(&self) -> &Treatment {
        &self.treatment
    }

    pub fn key(&self) -> FlowKey {
        FlowKey::from_selector(&self.selector)
    }
}
