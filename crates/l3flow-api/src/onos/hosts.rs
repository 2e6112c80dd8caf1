// Host inventory endpoint

use tracing::debug;

use crate::error::Error;
use crate::onos::client::OnosClient;
use crate::onos::models::{HostResponse, HostsEnvelope};

impl OnosClient {
    /// List all end hosts with their addresses and attachment points.
    ///
    /// `GET /hosts`
    pub async fn list_hosts(&self) -> Result<Vec<HostResponse>, Error> {
        let url = self.api_url(&["hosts"])?;
        debug!("listing hosts");
        let envelope: HostsEnvelope = self.get(url).await?;
        Ok(envelope.hosts)
    }
}
