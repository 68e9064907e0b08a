//! Image handling infrastructure.
//!
//! This module provides:
//! - Bounded decoding and JPEG re-encoding
//! - Memory caching with LRU eviction
//! - Disk caching for persistence
//! - Target binding for stale-result suppression
//! - Async image loading pipeline

pub mod cache_dir;
pub mod codec;
pub mod disk_cache;
pub mod http_fetcher;
pub mod loader;
pub mod memory_cache;
pub mod registry;

pub use cache_dir::{SHARED_CACHE_DIR_NAME, resolve_cache_dir};
pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskCacheHandle, DiskImageCache};
pub use http_fetcher::HttpImageFetcher;
pub use loader::{
    DecodeTarget, DiskFormat, FetchOutcome, ImageLoader, ImageLoaderConfig, ImageReadyEvent,
    LoadDispatch, PaintOutcome,
};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use registry::TargetRegistry;
