//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Photo feed client.
pub mod feed;
/// Image handling (decoding, caching, loading).
pub mod image;

pub use config::{AppConfig, CliArgs, LogLevel, StorageManager};
pub use feed::FeedClient;
pub use self::image::{
    CacheStats, DiskCacheHandle, DiskImageCache, HttpImageFetcher, ImageLoader, ImageLoaderConfig,
    ImageReadyEvent, MemoryImageCache,
};
