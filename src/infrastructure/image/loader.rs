//! Image loading orchestrator.
//!
//! Implements a three-tier cache: Memory -> Disk -> Network.
//!
//! `load` runs on the UI-owning task. Memory hits are painted immediately;
//! everything else goes to a bounded pool of worker tasks whose results come
//! back as [`ImageReadyEvent`]s for the UI task to [`ImageLoader::deliver`].
//! A result only reaches a target if the target is still bound to the same
//! key, checked before work starts, after it finishes, and again right
//! before painting.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{DecodedImage, ImageKey, ImageSource, LoadedImage, TargetId};
use crate::domain::errors::LoaderError;
use crate::domain::ports::{DisplayTarget, ImageFetcherPort};

use super::codec::{self, DEFAULT_JPEG_QUALITY};
use super::disk_cache::{DiskCacheHandle, DiskImageCache};
use super::memory_cache::{CacheStats, MemoryImageCache, default_budget_kb};
use super::registry::TargetRegistry;

/// Default number of concurrent fetch workers.
pub const DEFAULT_WORKER_THREADS: usize = 5;

/// Default decode bounds, a portrait phone screen.
pub const DEFAULT_SCREEN_WIDTH: u32 = 1080;
/// Default decode bounds, a portrait phone screen.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1920;

/// Which box network images are decoded against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeTarget {
    /// The screen size, so one decode serves every display size.
    #[default]
    Screen,
    /// The requesting target's size at the time of the request.
    Target,
}

/// What the disk tier stores for a network image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    /// The decoded, downsampled pixels re-encoded as JPEG.
    #[default]
    Jpeg,
    /// The bytes exactly as downloaded.
    Original,
}

/// Configuration for the image loader.
#[derive(Debug, Clone)]
pub struct ImageLoaderConfig {
    /// Memory cache budget in KB.
    pub memory_cache_kb: usize,
    /// Maximum concurrent fetches.
    pub worker_threads: usize,
    /// Screen width used as decode bound.
    pub screen_width: u32,
    /// Screen height used as decode bound.
    pub screen_height: u32,
    /// Decode bound policy.
    pub decode_to: DecodeTarget,
    /// Disk tier format.
    pub disk_format: DiskFormat,
    /// JPEG quality for [`DiskFormat::Jpeg`].
    pub jpeg_quality: u8,
}

impl Default for ImageLoaderConfig {
    fn default() -> Self {
        Self {
            memory_cache_kb: default_budget_kb(),
            worker_threads: DEFAULT_WORKER_THREADS,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            decode_to: DecodeTarget::default(),
            disk_format: DiskFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Message sent to the UI task when a worker has an image for a target.
#[derive(Debug, Clone)]
pub struct ImageReadyEvent {
    /// The target that requested the image.
    pub target: TargetId,
    /// The requested key.
    pub key: ImageKey,
    /// The decoded image at decode bounds.
    pub image: DecodedImage,
    /// Which tier produced it.
    pub source: ImageSource,
}

/// What `load` did with a request.
#[derive(Debug)]
pub enum LoadDispatch {
    /// Served from memory and painted before returning.
    Painted,
    /// Handed to a worker; the handle resolves when the worker is done.
    Queued(JoinHandle<FetchOutcome>),
}

/// Result of a worker task.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// An event was sent to the UI task.
    Delivered(ImageSource),
    /// The target was rebound or released; nothing was sent.
    Superseded,
    /// The image could not be produced; the target is left as is.
    Failed(LoaderError),
}

/// Result of a paint attempt on the UI task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// The target now shows the image.
    Painted,
    /// The target wants a different image; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
struct FetchRequest {
    target: TargetId,
    key: ImageKey,
    bounds: (u32, u32),
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// State shared between the loader and its workers.
struct LoaderShared {
    memory_cache: MemoryImageCache,
    disk_cache: DiskCacheHandle,
    registry: TargetRegistry,
    fetcher: Arc<dyn ImageFetcherPort>,
    in_flight: Mutex<HashMap<ImageKey, KeyLock>>,
    event_tx: mpsc::UnboundedSender<ImageReadyEvent>,
    config: ImageLoaderConfig,
}

/// Orchestrates image loading from memory, disk, and network.
///
/// Create one per application and share it; it owns the caches every
/// display target draws from.
pub struct ImageLoader {
    shared: Arc<LoaderShared>,
    workers: Arc<Semaphore>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a new image loader.
    ///
    /// Completed loads are sent to `event_tx`; the receiving side must run on
    /// the task that owns the display targets.
    #[must_use]
    pub fn new(
        config: ImageLoaderConfig,
        fetcher: Arc<dyn ImageFetcherPort>,
        disk_cache: DiskCacheHandle,
        event_tx: mpsc::UnboundedSender<ImageReadyEvent>,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.worker_threads.max(1)));
        info!(
            memory_cache_kb = config.memory_cache_kb,
            workers = config.worker_threads,
            decode_to = ?config.decode_to,
            disk_format = ?config.disk_format,
            "Image loader started"
        );

        Self {
            shared: Arc::new(LoaderShared {
                memory_cache: MemoryImageCache::new(config.memory_cache_kb),
                disk_cache,
                registry: TargetRegistry::new(),
                fetcher,
                in_flight: Mutex::new(HashMap::new()),
                event_tx,
                config,
            }),
            workers,
        }
    }

    /// Requests that `target` show the image at `url`.
    ///
    /// The target is cleared and bound to the url right away. A memory hit is
    /// painted before returning; otherwise a worker resolves the image and
    /// the result arrives as an [`ImageReadyEvent`]. Failures past this point
    /// leave the target empty and are reported through [`FetchOutcome`].
    ///
    /// Must be called from within the tokio runtime.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a blank or malformed url and `ShutDown`
    /// after [`ImageLoader::shutdown`].
    pub fn load(
        &self,
        target: &mut dyn DisplayTarget,
        url: &str,
    ) -> Result<LoadDispatch, LoaderError> {
        if self.workers.is_closed() {
            return Err(LoaderError::ShutDown);
        }
        let key = ImageKey::parse(url)?;
        let target_id = target.id();

        target.clear();
        self.shared.registry.bind(target_id, key.clone());

        if let Some(image) = self.shared.memory_cache.get(&key) {
            trace!(target = %target_id, key = %key, "Painting from memory cache");
            self.paint(target, &key, &image);
            return Ok(LoadDispatch::Painted);
        }

        let bounds = match self.shared.config.decode_to {
            DecodeTarget::Screen => (
                self.shared.config.screen_width,
                self.shared.config.screen_height,
            ),
            DecodeTarget::Target => target.dimensions(),
        };
        let request = FetchRequest {
            target: target_id,
            key,
            bounds,
        };

        let shared = self.shared.clone();
        let workers = self.workers.clone();
        let handle = tokio::spawn(async move {
            let Ok(_permit) = workers.acquire_owned().await else {
                return FetchOutcome::Failed(LoaderError::ShutDown);
            };
            shared.run_fetch(request).await
        });

        Ok(LoadDispatch::Queued(handle))
    }

    /// Paints a worker result onto `target` if it still wants it.
    ///
    /// Call on the UI task with the target whose id is `event.target`.
    pub fn deliver(&self, event: ImageReadyEvent, target: &mut dyn DisplayTarget) -> PaintOutcome {
        if target.id() != event.target {
            warn!(
                expected = %event.target,
                actual = %target.id(),
                "Event delivered to the wrong target"
            );
            return PaintOutcome::Stale;
        }
        let outcome = self.paint(target, &event.key, &event.image);
        if outcome == PaintOutcome::Painted {
            debug!(target = %event.target, key = %event.key, source = %event.source, "Image displayed");
        }
        outcome
    }

    fn paint(&self, target: &mut dyn DisplayTarget, key: &ImageKey, image: &DecodedImage) -> PaintOutcome {
        if self.shared.registry.is_stale(target.id(), key) {
            trace!(target = %target.id(), key = %key, "Discarding stale image");
            return PaintOutcome::Stale;
        }
        let (width, height) = target.dimensions();
        target.show(key, codec::scale_to_fit(image, width, height));
        PaintOutcome::Painted
    }

    /// Forgets `target`; results still in flight for it are discarded.
    ///
    /// Call when the UI layer drops a display target.
    pub fn release_target(&self, target: TargetId) {
        self.shared.registry.release(target);
    }

    /// Returns true if `target` is still waiting for (or showing) `url`.
    #[must_use]
    pub fn is_bound_to(&self, target: TargetId, url: &str) -> bool {
        ImageKey::parse(url).is_ok_and(|key| !self.shared.registry.is_stale(target, &key))
    }

    /// Returns true if the image for `url` is in the memory cache.
    #[must_use]
    pub fn is_cached_in_memory(&self, url: &str) -> bool {
        ImageKey::parse(url).is_ok_and(|key| self.shared.memory_cache.contains(&key))
    }

    /// Returns the memory-cached image for `url` without promoting it.
    #[must_use]
    pub fn peek_memory(&self, url: &str) -> Option<DecodedImage> {
        let key = ImageKey::parse(url).ok()?;
        self.shared.memory_cache.peek(&key)
    }

    /// Returns the number of keys being resolved by workers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.in_flight.lock().len()
    }

    /// Returns memory cache statistics.
    #[must_use]
    pub fn memory_cache_stats(&self) -> CacheStats {
        self.shared.memory_cache.stats()
    }

    /// Returns the disk cache once it is open, or `None` if it is inert.
    pub async fn disk_cache(&self) -> Option<Arc<DiskImageCache>> {
        self.shared.disk_cache.cache().await
    }

    /// Clears all caches.
    pub async fn clear_all(&self) {
        self.shared.memory_cache.clear();
        if let Some(disk) = self.shared.disk_cache.cache().await {
            if let Err(e) = disk.clear().await {
                warn!(error = %e, "Failed to clear disk cache");
            }
        }
        info!("Cleared all image caches");
    }

    /// Stops accepting loads and persists the disk index.
    ///
    /// Workers already running finish normally; queued ones resolve to
    /// `Failed(ShutDown)`.
    pub async fn shutdown(&self) {
        self.workers.close();
        if let Some(disk) = self.shared.disk_cache.cache().await {
            disk.flush().await;
        }
        info!("Image loader shut down");
    }
}

impl LoaderShared {
    async fn run_fetch(&self, request: FetchRequest) -> FetchOutcome {
        if self.registry.is_stale(request.target, &request.key) {
            debug!(target = %request.target, key = %request.key, "Request superseded before start");
            return FetchOutcome::Superseded;
        }

        let lock = self.key_lock(&request.key);
        let result = {
            let _guard = lock.lock().await;
            self.resolve(&request).await
        };
        self.release_key_lock(&request.key, &lock);

        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(key = %request.key, error = %e, "Image load failed");
                return FetchOutcome::Failed(e);
            }
        };

        if self.registry.is_stale(request.target, &request.key) {
            debug!(target = %request.target, key = %request.key, "Request superseded while loading");
            return FetchOutcome::Superseded;
        }

        let source = loaded.source;
        let event = ImageReadyEvent {
            target: request.target,
            key: loaded.key,
            image: loaded.image,
            source,
        };
        if self.event_tx.send(event).is_err() {
            debug!(key = %request.key, "UI receiver closed, dropping result");
            return FetchOutcome::Superseded;
        }
        FetchOutcome::Delivered(source)
    }

    async fn resolve(&self, request: &FetchRequest) -> Result<LoadedImage, LoaderError> {
        let key = &request.key;
        let (width, height) = request.bounds;

        if let Some(image) = self.memory_cache.get(key) {
            return Ok(LoadedImage {
                key: key.clone(),
                image,
                source: ImageSource::Memory,
            });
        }

        if let Some(bytes) = self.disk_cache.get_bytes(key).await {
            match decode_blocking(bytes, width, height).await {
                Ok(image) => {
                    debug!(key = %key, "Decoded image from disk cache");
                    self.memory_cache.put(key.clone(), image.clone());
                    return Ok(LoadedImage {
                        key: key.clone(),
                        image,
                        source: ImageSource::Disk,
                    });
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached blob is undecodable, evicting");
                    if let Some(disk) = self.disk_cache.cache().await {
                        disk.evict(key).await;
                    }
                }
            }
        }

        let bytes = self.fetcher.fetch(key).await?;
        let image = decode_blocking(bytes.clone(), width, height).await?;
        self.memory_cache.put(key.clone(), image.clone());
        self.persist(key, &image, bytes).await;

        debug!(key = %key, source = "network", "Image loaded successfully");

        Ok(LoadedImage {
            key: key.clone(),
            image,
            source: ImageSource::Network,
        })
    }

    /// Writes a freshly fetched image to the disk tier. Failures are logged
    /// and otherwise ignored.
    async fn persist(&self, key: &ImageKey, image: &DecodedImage, original: Bytes) {
        let blob = match self.config.disk_format {
            DiskFormat::Original => Ok(original),
            DiskFormat::Jpeg => {
                let image = image.clone();
                let quality = self.config.jpeg_quality;
                tokio::task::spawn_blocking(move || codec::encode_jpeg(&image, quality))
                    .await
                    .map_err(|e| LoaderError::decode(format!("encode task panicked: {e}")))
                    .and_then(|r| r.map(Bytes::from))
            }
        };

        let result = match blob {
            Ok(blob) => self.disk_cache.put_bytes(key, &blob).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {}
            Err(LoaderError::DiskUnavailable) => {
                trace!(key = %key, "Disk cache unavailable, skipping persist");
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to cache to disk"),
        }
    }

    fn key_lock(&self, key: &ImageKey) -> KeyLock {
        self.in_flight.lock().entry(key.clone()).or_default().clone()
    }

    /// Drops the key's lock from the map once nobody else is waiting on it.
    fn release_key_lock(&self, key: &ImageKey, lock: &KeyLock) {
        let mut in_flight = self.in_flight.lock();
        let unused = in_flight
            .get(key)
            .is_some_and(|held| Arc::ptr_eq(held, lock) && Arc::strong_count(lock) <= 2);
        if unused {
            in_flight.remove(key);
        }
    }
}

async fn decode_blocking(bytes: Bytes, width: u32, height: u32) -> Result<DecodedImage, LoaderError> {
    tokio::task::spawn_blocking(move || codec::decode_bounded(&bytes, width, height))
        .await
        .map_err(|e| LoaderError::decode(format!("decode task panicked: {e}")))?
}
