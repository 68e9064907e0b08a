//! Load feed use case implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::FeedError;
use crate::domain::ports::FeedPort;

/// Retrieves the list of image URLs to show in the grid.
#[derive(Clone)]
pub struct LoadFeedUseCase {
    feed_port: Arc<dyn FeedPort>,
}

impl LoadFeedUseCase {
    /// Creates new load feed use case.
    #[must_use]
    pub const fn new(feed_port: Arc<dyn FeedPort>) -> Self {
        Self { feed_port }
    }

    /// Fetches the feed and returns its non-blank URLs in feed order.
    ///
    /// # Errors
    /// Returns error if the feed cannot be fetched or parsed.
    pub async fn execute(&self) -> Result<Vec<String>, FeedError> {
        debug!("Loading photo feed");

        let urls = self.feed_port.fetch_image_urls().await.map_err(|e| {
            warn!(error = %e, network = e.is_network_error(), "Failed to load photo feed");
            e
        })?;

        let total = urls.len();
        let urls: Vec<String> = urls
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        if urls.len() < total {
            debug!(dropped = total - urls.len(), "Dropped blank feed entries");
        }
        info!(count = urls.len(), "Photo feed loaded");

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockFeedPort;

    #[tokio::test]
    async fn test_returns_urls_in_order() {
        let mut port = MockFeedPort::new();
        port.expect_fetch_image_urls().times(1).returning(|| {
            Ok(vec![
                "https://img.example/3".to_string(),
                "https://img.example/1".to_string(),
                "https://img.example/2".to_string(),
            ])
        });

        let use_case = LoadFeedUseCase::new(Arc::new(port));
        let urls = use_case.execute().await.unwrap();

        assert_eq!(
            urls,
            vec![
                "https://img.example/3",
                "https://img.example/1",
                "https://img.example/2"
            ]
        );
    }

    #[tokio::test]
    async fn test_drops_blank_urls() {
        let mut port = MockFeedPort::new();
        port.expect_fetch_image_urls().returning(|| {
            Ok(vec![
                String::new(),
                "https://img.example/a".to_string(),
                "   ".to_string(),
            ])
        });

        let use_case = LoadFeedUseCase::new(Arc::new(port));

        assert_eq!(use_case.execute().await.unwrap(), vec!["https://img.example/a"]);
    }

    #[tokio::test]
    async fn test_propagates_feed_errors() {
        let mut port = MockFeedPort::new();
        port.expect_fetch_image_urls()
            .returning(|| Err(FeedError::network("connection refused")));

        let use_case = LoadFeedUseCase::new(Arc::new(port));
        let result = use_case.execute().await;

        assert!(matches!(result, Err(FeedError::Network { .. })));
    }
}
