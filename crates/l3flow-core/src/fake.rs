// In-memory controller for loop tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use l3flow_api::onos::models::FlowInstallAck;

use crate::client::ControllerClient;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, FlowRule, Host, PacketInEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListDevices,
    ListHosts,
    Poll,
    Install(FlowRule),
    Clear(DeviceId),
}

fn unreachable_controller() -> CoreError {
    CoreError::ConnectionFailed {
        url: "http://fake/onos/v1".into(),
        reason: "connection refused".into(),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeController {
    devices: Mutex<Vec<Device>>,
    hosts: Mutex<Vec<Host>>,
    batches: Mutex<VecDeque<Result<Vec<PacketInEvent>, CoreError>>>,
    device_failures: Mutex<usize>,
    host_failures: Mutex<usize>,
    install_failures: Mutex<usize>,
    clear_failures: Mutex<HashSet<DeviceId>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeController {
    pub(crate) fn with_devices(ids: &[&str]) -> Self {
        let fake = Self::default();
        fake.set_devices(ids);
        fake
    }

    pub(crate) fn set_devices(&self, ids: &[&str]) {
        *self.devices.lock().unwrap() = ids.iter().map(|id| Device::with_id(*id)).collect();
    }

    pub(crate) fn set_hosts(&self, hosts: Vec<Host>) {
        *self.hosts.lock().unwrap() = hosts;
    }

    pub(crate) fn push_batch(&self, events: Vec<PacketInEvent>) {
        self.batches.lock().unwrap().push_back(Ok(events));
    }

    pub(crate) fn push_poll_failure(&self) {
        self.batches
            .lock()
            .unwrap()
            .push_back(Err(unreachable_controller()));
    }

    pub(crate) fn fail_device_lists(&self, n: usize) {
        *self.device_failures.lock().unwrap() = n;
    }

    pub(crate) fn fail_host_lists(&self, n: usize) {
        *self.host_failures.lock().unwrap() = n;
    }

    pub(crate) fn fail_installs(&self, n: usize) {
        *self.install_failures.lock().unwrap() = n;
    }

    pub(crate) fn fail_clear(&self, id: &str) {
        self.clear_failures.lock().unwrap().insert(id.into());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn installs(&self) -> Vec<FlowRule> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Install(rule) => Some(rule),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(counter: &Mutex<usize>) -> bool {
        let mut remaining = counter.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

impl ControllerClient for FakeController {
    async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.log(Call::ListDevices);
        if Self::take_failure(&self.device_failures) {
            return Err(unreachable_controller());
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, CoreError> {
        self.log(Call::ListHosts);
        if Self::take_failure(&self.host_failures) {
            return Err(unreachable_controller());
        }
        Ok(self.hosts.lock().unwrap().clone())
    }

    async fn poll_packet_events(&self) -> Result<Vec<PacketInEvent>, CoreError> {
        self.log(Call::Poll);
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn install_flow(&self, rule: &FlowRule) -> Result<FlowInstallAck, CoreError> {
        self.log(Call::Install(rule.clone()));
        if Self::take_failure(&self.install_failures) {
            return Err(CoreError::Api {
                message: "HTTP 500".into(),
                status: Some(500),
            });
        }
        Ok(FlowInstallAck {
            status: 201,
            location: None,
        })
    }

    async fn clear_flows(&self, device: &DeviceId) -> Result<(), CoreError> {
        self.log(Call::Clear(device.clone()));
        if self.clear_failures.lock().unwrap().contains(device) {
            return Err(unreachable_controller());
        }
        Ok(())
    }
}
