// Packet-in polling endpoint

use tracing::trace;

use crate::error::Error;
use crate::onos::client::OnosClient;
use crate::onos::models::{PacketResponse, PacketsEnvelope};

impl OnosClient {
    /// Fetch the packet-in events queued since the previous poll.
    ///
    /// `GET /packets` -- a single non-blocking fetch; the caller owns the cadence.
    pub async fn poll_packets(&self) -> Result<Vec<PacketResponse>, Error> {
        let url = self.api_url(&["packets"])?;
        trace!("polling packet-in events");
        let envelope: PacketsEnvelope = self.get(url).await?;
        Ok(envelope.packets)
    }
}
