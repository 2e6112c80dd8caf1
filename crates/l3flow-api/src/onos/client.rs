// ONOS REST HTTP client
//
// Wraps `reqwest::Client` with API-root URL construction, basic-auth
// injection, and status/body checking. Endpoint groups (devices, hosts,
// packets, flows) are inherent methods in sibling files so this module
// stays focused on transport mechanics.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// HTTP basic credentials for the controller (`karaf`/`karaf` on a stock ONOS).
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Raw HTTP client for the controller's REST API.
///
/// All paths are resolved against a versioned API root such as
/// `http://controller:8181/onos/v1`. The client holds no session state:
/// credentials are attached to every request and nothing is retried here.
#[derive(Debug, Clone)]
pub struct OnosClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Option<BasicAuth>,
}

impl OnosClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        auth: Option<BasicAuth>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, auth))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, auth: Option<BasicAuth>) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{segment}/{segment}...`.
    ///
    /// Segments are percent-encoded individually, so device ids such as
    /// `of:0000000000000001` land in the path verbatim and never split.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::UnusableBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth {
            Some(auth) => {
                builder.basic_auth(&auth.username, Some(auth.password.expose_secret()))
            }
            None => builder,
        }
    }

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(Error::Transport)?;
        let resp = check_status(resp, |s| s.is_success()).await?;

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(bytes = body.len(), "response body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Send a POST request with a JSON body; `accept` decides which
    /// statuses count as success.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: &impl serde::Serialize,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<Response, Error> {
        debug!("POST {}", url);

        let resp = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp, accept).await
    }

    /// Send a DELETE request; any 2xx is success.
    pub(crate) async fn delete(&self, url: Url) -> Result<Response, Error> {
        debug!("DELETE {}", url);

        let resp = self
            .request(Method::DELETE, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        check_status(resp, |s| s.is_success()).await
    }
}

/// Turn an unaccepted status into an `Error`, keeping the body for diagnostics.
async fn check_status(
    resp: Response,
    accept: impl Fn(StatusCode) -> bool,
) -> Result<Response, Error> {
    let status = resp.status();
    if accept(status) {
        return Ok(resp);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            status: status.as_u16(),
        });
    }

    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        url,
        body,
    })
}
