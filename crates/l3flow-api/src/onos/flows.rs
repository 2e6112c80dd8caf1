// Flow rule endpoints
//
// Installation (POST) and bulk teardown (DELETE) of flow rules on a
// single device. Neither call is retried here.

use reqwest::StatusCode;
use reqwest::header::LOCATION;
use tracing::debug;

use crate::error::Error;
use crate::onos::client::OnosClient;
use crate::onos::models::{FlowInstallAck, FlowRuleRequest};

impl OnosClient {
    /// Install a flow rule on a device.
    ///
    /// `POST /flows/{deviceId}` -- only 200 and 201 count as success.
    pub async fn install_flow(
        &self,
        device_id: &str,
        rule: &FlowRuleRequest,
    ) -> Result<FlowInstallAck, Error> {
        let url = self.api_url(&["flows", device_id])?;
        debug!(device = device_id, priority = rule.priority, "installing flow");

        let resp = self
            .post(url, rule, |s| s == StatusCode::OK || s == StatusCode::CREATED)
            .await?;

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Ok(FlowInstallAck {
            status: resp.status().as_u16(),
            location,
        })
    }

    /// Remove every flow rule on a device.
    ///
    /// `DELETE /flows/{deviceId}`
    pub async fn clear_flows(&self, device_id: &str) -> Result<(), Error> {
        let url = self.api_url(&["flows", device_id])?;
        debug!(device = device_id, "clearing flows");
        self.delete(url).await?;
        Ok(())
    }
}
