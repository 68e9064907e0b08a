//! In-memory LRU image cache bounded by decoded size.

use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::domain::entities::{DecodedImage, ImageKey};

/// Fallback budget when the available memory cannot be determined (512 MB).
const FALLBACK_AVAILABLE_KB: usize = 512 * 1024;

/// Share of available memory given to the cache.
const MEMORY_FRACTION: usize = 6;

/// Returns the default budget: one sixth of available memory, in KB.
#[must_use]
pub fn default_budget_kb() -> usize {
    available_memory_kb().unwrap_or(FALLBACK_AVAILABLE_KB) / MEMORY_FRACTION
}

fn available_memory_kb() -> Option<usize> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}

struct Inner {
    entries: LruCache<ImageKey, DecodedImage>,
    size_kb: usize,
}

/// In-memory LRU cache for decoded images.
///
/// Capacity is measured in kilobytes of decoded pixels, not in entries.
/// Every operation takes the lock once, so workers and the UI task never
/// hold it across an await or a decode.
pub struct MemoryImageCache {
    inner: Mutex<Inner>,
    budget_kb: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a new cache holding at most `budget_kb` kilobytes.
    #[must_use]
    pub fn new(budget_kb: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                size_kb: 0,
            }),
            budget_kb: budget_kb.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with one sixth of the available memory.
    #[must_use]
    pub fn with_default_budget() -> Self {
        Self::new(default_budget_kb())
    }

    /// Returns the configured budget in KB.
    #[must_use]
    pub const fn budget_kb(&self) -> usize {
        self.budget_kb
    }

    /// Gets an image and marks it most recently used.
    pub fn get(&self, key: &ImageKey) -> Option<DecodedImage> {
        let mut inner = self.inner.lock();
        if let Some(img) = inner.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(img.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    /// Peeks at an image without promoting it in the LRU.
    pub fn peek(&self, key: &ImageKey) -> Option<DecodedImage> {
        self.inner.lock().entries.peek(key).cloned()
    }

    /// Stores an image, evicting least recently used entries until the
    /// cache is back under budget.
    ///
    /// Returns false if the image alone exceeds the budget and was not kept.
    pub fn put(&self, key: ImageKey, image: DecodedImage) -> bool {
        let size = image.footprint_kb();
        let mut inner = self.inner.lock();

        if let Some(old) = inner.entries.pop(&key) {
            inner.size_kb -= old.footprint_kb();
        }

        if size > self.budget_kb {
            debug!(
                key = %key,
                size_kb = size,
                budget_kb = self.budget_kb,
                "Image larger than memory budget, not caching"
            );
            return false;
        }

        inner.entries.put(key.clone(), image);
        inner.size_kb += size;

        while inner.size_kb > self.budget_kb {
            let Some((evicted, img)) = inner.entries.pop_lru() else {
                break;
            };
            inner.size_kb -= img.footprint_kb();
            debug!(key = %evicted, size_kb = img.footprint_kb(), "Evicted image from memory cache");
        }

        trace!(key = %key, size_kb = size, total_kb = inner.size_kb, "Stored image in memory cache");
        true
    }

    /// Removes an image.
    pub fn evict(&self, key: &ImageKey) {
        let mut inner = self.inner.lock();
        if let Some(img) = inner.entries.pop(key) {
            inner.size_kb -= img.footprint_kb();
            debug!(key = %key, "Evicted image from memory cache");
        }
    }

    /// Returns true if the key is cached, without promoting it.
    pub fn contains(&self, key: &ImageKey) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Returns the number of cached images.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total decoded size in KB.
    pub fn size_kb(&self) -> usize {
        self.inner.lock().size_kb
    }

    /// Drops every cached image.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.size_kb = 0;
        debug!("Cleared memory image cache");
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let inner = self.inner.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: inner.entries.len(),
            size_kb: inner.size_kb,
            budget_kb: self.budget_kb,
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_budget()
    }
}

impl std::fmt::Debug for MemoryImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageCache")
            .field("budget_kb", &self.budget_kb)
            .finish_non_exhaustive()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of cached images.
    pub entries: usize,
    /// Current decoded size in KB.
    pub size_kb: usize,
    /// Configured budget in KB.
    pub budget_kb: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Memory cache: {} images, {}/{} KB, {:.1}% hit rate ({} hits, {} misses)",
            self.entries, self.size_kb, self.budget_kb, self.hit_rate, self.hits, self.misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> ImageKey {
        ImageKey::parse(&format!("https://example.com/{name}.jpg")).unwrap()
    }

    /// 32x32 RGBA is exactly 4 KB.
    fn four_kb_image() -> DecodedImage {
        DecodedImage::new(image::DynamicImage::new_rgba8(32, 32))
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = MemoryImageCache::new(64);
        let img = DecodedImage::new(image::DynamicImage::new_rgb8(100, 100));

        assert!(cache.put(key("a"), img.clone()));
        let retrieved = cache.get(&key("a")).unwrap();

        assert!(retrieved.ptr_eq(&img));
        assert_eq!(retrieved.width(), 100);
    }

    #[test]
    fn test_cache_miss() {
        let cache = MemoryImageCache::new(64);
        assert!(cache.get(&key("missing")).is_none());
    }

    #[test]
    fn test_eviction_is_by_size() {
        let cache = MemoryImageCache::new(8);

        cache.put(key("a"), four_kb_image());
        cache.put(key("b"), four_kb_image());
        assert_eq!(cache.size_kb(), 8);

        cache.put(key("c"), four_kb_image());

        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());
        assert!(cache.size_kb() <= cache.budget_kb());
    }

    #[test]
    fn test_get_promotes_entry() {
        let cache = MemoryImageCache::new(8);

        cache.put(key("a"), four_kb_image());
        cache.put(key("b"), four_kb_image());
        let _ = cache.get(&key("a"));
        cache.put(key("c"), four_kb_image());

        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
    }

    #[test]
    fn test_peek_does_not_promote() {
        let cache = MemoryImageCache::new(8);

        cache.put(key("a"), four_kb_image());
        cache.put(key("b"), four_kb_image());
        let _ = cache.peek(&key("a"));
        cache.put(key("c"), four_kb_image());

        assert!(cache.peek(&key("a")).is_none());
    }

    #[test]
    fn test_overwrite_replaces_accounting() {
        let cache = MemoryImageCache::new(64);

        cache.put(key("a"), four_kb_image());
        cache.put(key("a"), DecodedImage::new(image::DynamicImage::new_rgba8(64, 32)));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_kb(), 8);
    }

    #[test]
    fn test_oversized_entry_not_kept() {
        let cache = MemoryImageCache::new(2);

        assert!(!cache.put(key("big"), four_kb_image()));
        assert!(cache.is_empty());
        assert_eq!(cache.size_kb(), 0);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let cache = MemoryImageCache::new(30);
        for i in 0..50 {
            let side = 16 + (i % 5) * 8;
            cache.put(
                key(&i.to_string()),
                DecodedImage::new(image::DynamicImage::new_rgba8(side, side)),
            );
            assert!(cache.size_kb() <= 30);
        }
    }

    #[test]
    fn test_evict_and_clear() {
        let cache = MemoryImageCache::new(64);
        cache.put(key("a"), four_kb_image());
        cache.put(key("b"), four_kb_image());

        cache.evict(&key("a"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size_kb(), 4);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size_kb(), 0);
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryImageCache::new(64);
        cache.put(key("a"), four_kb_image());

        let _ = cache.get(&key("a"));
        let _ = cache.get(&key("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.size_kb, 4);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_budget_is_positive() {
        assert!(default_budget_kb() > 0);
    }
}
