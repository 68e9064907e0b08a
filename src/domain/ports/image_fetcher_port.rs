//! Port definition for fetching encoded image bytes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::ImageKey;
use crate::domain::errors::LoaderError;

/// Port for downloading encoded images.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ImageFetcherPort: Send + Sync {
    /// Downloads the encoded bytes behind `key`.
    async fn fetch(&self, key: &ImageKey) -> Result<Bytes, LoaderError>;
}
