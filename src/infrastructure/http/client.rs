//! HTTP client for catalog documents and avatar images.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::errors::{FetchError, ImageLoadError};
use crate::domain::ports::{ImageFetchPort, JsonFetchPort};

const USER_AGENT: &str = concat!("avatar-picker/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shared HTTP client for GET requests.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates new client with the given request timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    /// Returns the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl JsonFetchPort for HttpClient {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url = %url, "Fetching JSON");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "JSON request failed");
                if e.is_timeout() {
                    FetchError::network(url, "request timed out")
                } else {
                    FetchError::network(url, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::parse(url, e.to_string()))
    }
}

#[async_trait]
impl ImageFetchPort for HttpClient {
    async fn fetch_image(&self, url: &str) -> Result<Bytes, ImageLoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageLoadError::network(url, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ImageLoadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ImageLoadError::network(url, format!("failed to read body: {e}")))
    }
}
