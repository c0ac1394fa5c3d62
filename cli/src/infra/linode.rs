//! Linode API v4 client: infrastructure implementation of `ComputeService`.
//!
//! Thin JSON-over-HTTPS adapter: one request per port call, no retries.
//! Transient failures surface to the caller unchanged.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::ComputeService;
use crate::domain::{
    ConfigProfile, ConfigProfileRequest, Credentials, DeviceMap, Disk, DiskId, DiskRequest, Node,
    NodeId, NodeRequest, NodeType,
};

/// Public Linode API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.linode.com/v4";

/// Upper bound on a single HTTP exchange. Polls are bounded separately.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A failed Linode API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {path} returned HTTP {status}: {reasons}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        reasons: String,
    },

    #[error("{method} {path} could not be sent")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned an unexpected body")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Error body returned by the API on 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    field: Option<String>,
    reason: String,
}

/// One page of a paginated collection.
#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    page: u32,
    pages: u32,
}

#[derive(Debug, Serialize)]
struct RescueRequest {
    devices: DeviceMap,
}

/// Authenticated Linode API client.
pub struct LinodeClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl LinodeClient {
    /// Create a client for `base_url` (normally [`DEFAULT_API_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(credentials: Credentials, base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("linode-prep/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(self.credentials.token())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path);
        self.execute(Method::GET, path, request).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.execute(Method::POST, path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        tracing::debug!(%method, path, "linode api request");
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(ApiError::Transport {
                    method,
                    path: path.to_string(),
                    source,
                });
            }
        };
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "linode api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                reasons: error_reasons(&body),
            });
        }
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            method,
            path: path.to_string(),
            source,
        })
    }
}

/// Summarise an API error body as `field: reason; reason`.
fn error_reasons(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .iter()
            .map(|e| match &e.field {
                Some(field) => format!("{field}: {}", e.reason),
                None => e.reason.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ if body.trim().is_empty() => "no details".to_string(),
        _ => body.trim().to_string(),
    }
}

impl ComputeService for LinodeClient {
    async fn node_type(&self, id: &str) -> Result<NodeType> {
        Ok(self.get(&format!("/linode/types/{id}")).await?)
    }

    async fn create_node(&self, request: &NodeRequest<'_>) -> Result<Node> {
        Ok(self.post("/linode/instances", request).await?)
    }

    async fn get_node(&self, id: NodeId) -> Result<Node> {
        Ok(self.get(&format!("/linode/instances/{id}")).await?)
    }

    async fn list_disks(&self, node: NodeId) -> Result<Vec<Disk>> {
        let mut disks = Vec::new();
        let mut page = 1;
        loop {
            let batch: Page<Disk> = self
                .get(&format!("/linode/instances/{node}/disks?page={page}"))
                .await?;
            disks.extend(batch.data);
            if batch.page >= batch.pages {
                return Ok(disks);
            }
            page = batch.page + 1;
        }
    }

    async fn create_disk(&self, node: NodeId, request: &DiskRequest<'_>) -> Result<Disk> {
        Ok(self
            .post(&format!("/linode/instances/{node}/disks"), request)
            .await?)
    }

    async fn get_disk(&self, node: NodeId, disk: DiskId) -> Result<Disk> {
        Ok(self
            .get(&format!("/linode/instances/{node}/disks/{disk}"))
            .await?)
    }

    async fn create_config_profile(
        &self,
        node: NodeId,
        request: &ConfigProfileRequest<'_>,
    ) -> Result<ConfigProfile> {
        Ok(self
            .post(&format!("/linode/instances/{node}/configs"), request)
            .await?)
    }

    async fn rescue(&self, node: NodeId, disks: &[DiskId]) -> Result<()> {
        let body = RescueRequest {
            devices: DeviceMap::from_disks(disks)?,
        };
        let _: IgnoredAny = self
            .post(&format!("/linode/instances/{node}/rescue"), &body)
            .await?;
        Ok(())
    }
}
