//! HTTP transport for tile sources.
//!
//! [`AsyncHttpClient`] is the seam tests replace; [`AsyncReqwestClient`] is
//! the production client with pooled keep-alive connections.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::types::ProviderError;

/// Minimal GET-only client used by [`HttpTileSource`](super::HttpTileSource).
pub trait AsyncHttpClient: Send + Sync {
    /// Body of `url`. Non-success statuses map to [`ProviderError::Status`].
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// User-Agent sent when the config does not set one.
///
/// Public tile servers (OpenStreetMap in particular) reject requests without
/// an identifying User-Agent.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "offmap/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/offmap/offmap)"
);

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed client shared by all tile fetches of a source.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Client with [`DEFAULT_TIMEOUT`] and [`DEFAULT_USER_AGENT`].
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Client with an explicit request timeout and User-Agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            // Keep connections alive for parallel tile requests
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(map_reqwest_error(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(ProviderError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(map_reqwest_error(e))
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::HttpError(format!("Request failed: {}", e))
    }
}
