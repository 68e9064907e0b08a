//! Photo feed HTTP client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::dto::{ErrorResponse, PhotoDto};
use crate::domain::errors::FeedError;
use crate::domain::ports::FeedPort;
use crate::infrastructure::config::FeedConfig;

const USER_AGENT: &str = concat!("photogrid/", env!("CARGO_PKG_VERSION"));

/// Fetches the photo feed and flattens it to image URLs.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    endpoint: String,
    client_id: Option<String>,
    per_page: u32,
}

impl FeedClient {
    /// Creates a client from feed configuration.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: &FeedConfig, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FeedError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            client_id: config.client_id.clone(),
            per_page: config.per_page,
        })
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> FeedError {
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) if !body.errors.is_empty() => body.errors.join("; "),
            _ => status.canonical_reason().unwrap_or("Unknown").to_string(),
        };

        match status {
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                FeedError::network(format!("feed temporarily unavailable: {message}"))
            }
            _ => FeedError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl FeedPort for FeedClient {
    async fn fetch_image_urls(&self) -> Result<Vec<String>, FeedError> {
        let mut query = vec![("per_page", self.per_page.to_string())];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        debug!(endpoint = %self.endpoint, per_page = self.per_page, "Fetching photo feed");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to reach feed endpoint");
                if e.is_timeout() {
                    FeedError::network("request timed out")
                } else {
                    FeedError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::network(format!("failed to read feed body: {e}")))?;

        flatten_feed(&body)
    }
}

/// Parses a feed payload into its `urls.regular` values, in feed order.
///
/// Entries without a regular rendition are skipped.
///
/// # Errors
/// Returns `Malformed` if the payload is not a JSON array of photos.
pub fn flatten_feed(body: &str) -> Result<Vec<String>, FeedError> {
    let photos: Vec<PhotoDto> = serde_json::from_str(body)
        .map_err(|e| FeedError::malformed(format!("failed to parse feed: {e}")))?;

    Ok(photos
        .into_iter()
        .filter_map(|photo| photo.urls.regular)
        .collect())
}
