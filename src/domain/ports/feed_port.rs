//! Port definition for the photo feed.

use async_trait::async_trait;

use crate::domain::errors::FeedError;

/// Port for retrieving the list of photo URLs to display.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedPort: Send + Sync {
    /// Fetches the feed and returns its image URLs in feed order.
    async fn fetch_image_urls(&self) -> Result<Vec<String>, FeedError>;
}
