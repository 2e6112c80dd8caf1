// ── Controller seam ──
//
// The reactive loop talks to the controller only through this trait.
// `OnosClient` is the production implementation; tests plug in fakes.

use std::future::Future;

use l3flow_api::onos::models::{FlowInstallAck, FlowRuleRequest};
use l3flow_api::{BasicAuth, OnosClient, TlsMode, TransportConfig};

use crate::config::{ControllerConfig, TlsVerification};
use crate::convert;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, FlowRule, Host, PacketInEvent};

/// Stateless access to the controller's device, host, packet and flow surface.
///
/// Each call is a single request with no retry; retry policy belongs to
/// the caller.
pub trait ControllerClient: Send + Sync {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    fn list_hosts(&self) -> impl Future<Output = Result<Vec<Host>, CoreError>> + Send;

    /// One non-blocking fetch of pending packet-in events, in controller order.
    fn poll_packet_events(
        &self,
    ) -> impl Future<Output = Result<Vec<PacketInEvent>, CoreError>> + Send;

    fn install_flow(
        &self,
        rule: &FlowRule,
    ) -> impl Future<Output = Result<FlowInstallAck, CoreError>> + Send;

    fn clear_flows(&self, device: &DeviceId) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl ControllerClient for OnosClient {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let raw = OnosClient::list_devices(self).await?;
        Ok(raw.into_iter().map(Device::from).collect())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, CoreError> {
        let raw = OnosClient::list_hosts(self).await?;
        Ok(raw.into_iter().map(Host::from).collect())
    }

    async fn poll_packet_events(&self) -> Result<Vec<PacketInEvent>, CoreError> {
        let raw = self.poll_packets().await?;
        Ok(convert::packet_events(raw))
    }

    async fn install_flow(&self, rule: &FlowRule) -> Result<FlowInstallAck, CoreError> {
        rule.validate()?;
        let body = FlowRuleRequest::from(rule);
        Ok(OnosClient::install_flow(self, rule.device_id().as_str(), &body).await?)
    }

    async fn clear_flows(&self, device: &DeviceId) -> Result<(), CoreError> {
        Ok(OnosClient::clear_flows(self, device.as_str()).await?)
    }
}

/// Build an `OnosClient` from explicit configuration.
pub fn connect(config: &ControllerConfig) -> Result<OnosClient, CoreError> {
    let transport = TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    };
    let auth = config.credentials.as_ref().map(|c| BasicAuth {
        username: c.username.clone(),
        password: c.password.clone(),
    });

    Ok(OnosClient::new(config.url.clone(), auth, &transport)?)
}
