//! HTTP implementation of the image fetcher port.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::domain::entities::ImageKey;
use crate::domain::errors::LoaderError;
use crate::domain::ports::ImageFetcherPort;

const USER_AGENT: &str = concat!("photogrid/", env!("CARGO_PKG_VERSION"));

/// Downloads images with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given request timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(timeout_secs: u64) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LoaderError::network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcherPort for HttpImageFetcher {
    async fn fetch(&self, key: &ImageKey) -> Result<Bytes, LoaderError> {
        debug!(key = %key, "Downloading image from network");

        let response = self
            .client
            .get(key.as_str())
            .send()
            .await
            .map_err(|e| LoaderError::network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| LoaderError::network(format!("failed to read body: {e}")))
    }
}
