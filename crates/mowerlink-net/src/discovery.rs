//! [`EndpointResolver`] – one-shot backend endpoint discovery.
//!
//! Asks the mower's configuration endpoint where its camera feed and
//! streaming channel live. Discovery failing is a degraded state, not a
//! fatal one: the resolver always hands back a usable [`EndpointSet`], with
//! `is_fallback = true` and the documented placeholder values when the
//! request did not produce a well-formed answer. There is no automatic
//! retry; the caller decides whether to re-resolve.

use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use mowerlink_types::{EndpointSet, LinkError};

/// Port the mower's configuration endpoint listens on.
pub const DEFAULT_DISCOVERY_PORT: u16 = 8088;

/// Path of the configuration endpoint.
pub const DISCOVERY_PATH: &str = "/v1/endpoints";

/// Placeholder camera image shown when discovery fails.
pub const FALLBACK_CAMERA_URL: &str =
    "https://media.giphy.com/media/3o6vXRxrhj7Ov94Gbu/source.gif";

/// Per-request deadline for the discovery round-trip.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wire shape of the discovery response body.
#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    camera: String,
    ws: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// EndpointResolver
// ─────────────────────────────────────────────────────────────────────────────

/// Resolves the backend's endpoint set once at startup.
pub struct EndpointResolver {
    http: reqwest::Client,
    discovery_url: String,
}

impl EndpointResolver {
    /// Resolver for the conventional `http://{host}:{port}/v1/endpoints`.
    pub fn new(host: &str, port: u16) -> Self {
        Self::from_url(format!("http://{host}:{port}{DISCOVERY_PATH}"))
    }

    /// Resolver for an explicit discovery URL.
    pub fn from_url(discovery_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            discovery_url: discovery_url.into(),
        }
    }

    /// The URL this resolver will query.
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    /// Resolve the endpoint set. Infallible by contract: any network or
    /// parse failure is logged and answered with [`Self::fallback`].
    pub async fn resolve(&self) -> EndpointSet {
        match self.request().await {
            Ok(endpoints) => {
                info!(
                    camera = %endpoints.camera,
                    ws = %endpoints.ws,
                    "discovered backend endpoints"
                );
                endpoints
            }
            Err(e) => {
                warn!(
                    url = %self.discovery_url,
                    error = %e,
                    "endpoint discovery failed, using fallback values"
                );
                Self::fallback()
            }
        }
    }

    /// The constant degraded endpoint set: placeholder camera image and no
    /// streaming channel.
    pub fn fallback() -> EndpointSet {
        EndpointSet {
            camera: FALLBACK_CAMERA_URL.to_string(),
            ws: String::new(),
            is_fallback: true,
        }
    }

    async fn request(&self) -> Result<EndpointSet, LinkError> {
        let response = self
            .http
            .get(&self.discovery_url)
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| LinkError::Discovery(e.to_string()))?
            .error_for_status()
            .map_err(|e| LinkError::Discovery(e.to_string()))?;

        let body: DiscoveryResponse = response
            .json()
            .await
            .map_err(|e| LinkError::Discovery(e.to_string()))?;

        Ok(EndpointSet {
            camera: body.camera,
            ws: body.ws,
            is_fallback: false,
        })
    }
}
