// ── Bulk flow clearing ──
//
// Shared by the loop's Clearing phase and the one-shot `clear` command.
// Devices are independent, so every DELETE goes out at once.

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::client::ControllerClient;
use crate::error::CoreError;
use crate::model::DeviceId;

/// Outcome of clearing a set of devices.
#[derive(Debug, Default)]
pub struct ClearReport {
    pub cleared: Vec<DeviceId>,
    pub failed: Vec<(DeviceId, CoreError)>,
}

impl ClearReport {
    pub fn attempted(&self) -> usize {
        self.cleared.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Issue `clear_flows` for every device and wait for all of them.
///
/// Individual failures are logged and reported, never propagated.
pub async fn clear_devices<C: ControllerClient>(client: &C, devices: &[DeviceId]) -> ClearReport {
    let results = join_all(devices.iter().map(|id| async move {
        let result = client.clear_flows(id).await;
        (id.clone(), result)
    }))
    .await;

    let mut report = ClearReport::default();
    for (id, result) in results {
        match result {
            Ok(()) => {
                info!(device = %id, "flows cleared");
                report.cleared.push(id);
            }
            Err(e) => {
                warn!(device = %id, error = %e, "failed to clear flows");
                report.failed.push((id, e));
            }
        }
    }
    report
}
