// Device inventory endpoint

use tracing::debug;

use crate::error::Error;
use crate::onos::client::OnosClient;
use crate::onos::models::{DeviceResponse, DevicesEnvelope};

impl OnosClient {
    /// List all infrastructure devices known to the controller.
    ///
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceResponse>, Error> {
        let url = self.api_url(&["devices"])?;
        debug!("listing devices");
        let envelope: DevicesEnvelope = self.get(url).await?;
        Ok(envelope.devices)
    }
}
