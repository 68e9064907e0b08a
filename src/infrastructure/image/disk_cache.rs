//! Disk-based image cache for persistence across sessions.
//!
//! Layout: one directory holding `index.json` plus one `<sha>.img` blob per
//! key. The index keeps entries in access order; when it is missing or
//! unreadable it is rebuilt from the blob files, oldest modification first.
//! Blobs the index does not know about are adopted as the oldest entries, so
//! every file in the directory counts against the budget.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, trace, warn};

use crate::domain::entities::ImageKey;
use crate::domain::errors::LoaderError;

/// Maximum disk cache size in bytes (10 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 10 * 1024 * 1024;

const INDEX_FILE: &str = "index.json";
const INDEX_VERSION: u32 = 1;
const BLOB_EXTENSION: &str = "img";
const TMP_EXTENSION: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    name: String,
    #[serde(default)]
    url: String,
    size: u64,
    last_access_ms: u64,
}

/// Entries are stored least recently used first.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    entries: Vec<IndexEntry>,
}

struct State {
    entries: LruCache<String, IndexEntry>,
    current_size: u64,
    dirty: bool,
}

/// Disk-based cache that persists encoded image bytes.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    state: Mutex<State>,
}

impl DiskImageCache {
    /// Opens (or creates) a cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created or listed.
    pub async fn open(cache_dir: PathBuf, max_size: u64) -> Result<Self, LoaderError> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| LoaderError::io(format!("failed to create cache dir: {e}")))?;

        let blobs = scan_blobs(&cache_dir).await?;
        let entries = match load_index(&cache_dir).await {
            Some(indexed) => reconcile(indexed, blobs),
            None => blobs,
        };

        let mut lru = LruCache::unbounded();
        let mut current_size = 0u64;
        for entry in entries {
            current_size += entry.size;
            lru.put(entry.name.clone(), entry);
        }

        let cache = Self {
            cache_dir,
            max_size,
            state: Mutex::new(State {
                entries: lru,
                current_size,
                dirty: true,
            }),
        };

        {
            let mut state = cache.state.lock().await;
            cache.evict_to_budget(&mut state).await;
            cache.write_index(&mut state).await;
            info!(
                path = %cache.cache_dir.display(),
                entries = state.entries.len(),
                size = state.current_size,
                max_size = cache.max_size,
                "Disk cache opened"
            );
        }

        Ok(cache)
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the configured budget in bytes.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{name}.{BLOB_EXTENSION}"))
    }

    /// Gets raw image bytes.
    ///
    /// A missing or unreadable blob is dropped from the index and reported as
    /// a miss.
    pub async fn get_bytes(&self, key: &ImageKey) -> Option<Bytes> {
        let name = key.disk_name();
        let mut state = self.state.lock().await;

        if !state.entries.contains(&name) {
            trace!(key = %key, "Disk cache miss");
            return None;
        }

        let path = self.blob_path(&name);
        match fs::read(&path).await {
            Ok(bytes) => {
                if let Some(entry) = state.entries.get_mut(&name) {
                    entry.last_access_ms = now_ms();
                }
                state.dirty = true;
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                Some(Bytes::from(bytes))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached blob, dropping entry");
                if let Some(entry) = state.entries.pop(&name) {
                    state.current_size -= entry.size;
                    state.dirty = true;
                }
                None
            }
        }
    }

    /// Stores raw bytes, evicting the oldest entries if the budget is exceeded.
    ///
    /// # Errors
    /// Returns error if the blob is larger than the whole budget or cannot be
    /// written.
    pub async fn put_bytes(&self, key: &ImageKey, bytes: &[u8]) -> Result<(), LoaderError> {
        let new_size = bytes.len() as u64;
        if new_size > self.max_size {
            return Err(LoaderError::io(format!(
                "blob of {new_size} bytes exceeds disk budget of {} bytes",
                self.max_size
            )));
        }

        let name = key.disk_name();
        let path = self.blob_path(&name);
        let tmp_path = self.cache_dir.join(format!("{name}.{TMP_EXTENSION}"));

        let mut state = self.state.lock().await;

        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| LoaderError::io(format!("failed to recreate cache dir: {e}")))?;
        fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| LoaderError::io(format!("failed to write cache file: {e}")))?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(LoaderError::io(format!("failed to commit cache file: {e}")));
        }

        if let Some(old) = state.entries.pop(&name) {
            state.current_size -= old.size;
        }
        state.entries.put(
            name.clone(),
            IndexEntry {
                name,
                url: key.as_str().to_string(),
                size: new_size,
                last_access_ms: now_ms(),
            },
        );
        state.current_size += new_size;
        state.dirty = true;

        debug!(key = %key, path = %path.display(), size = new_size, "Stored image in disk cache");

        self.evict_to_budget(&mut state).await;
        self.write_index(&mut state).await;

        Ok(())
    }

    /// Checks if an image is cached.
    pub async fn contains(&self, key: &ImageKey) -> bool {
        self.state.lock().await.entries.contains(&key.disk_name())
    }

    /// Removes an image from disk cache.
    pub async fn evict(&self, key: &ImageKey) {
        let name = key.disk_name();
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.pop(&name) {
            state.current_size -= entry.size;
            state.dirty = true;
            self.remove_blob(&name).await;
            debug!(key = %key, "Evicted from disk cache");
            self.write_index(&mut state).await;
        }
    }

    /// Clears the entire disk cache.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be read.
    pub async fn clear(&self) -> Result<(), LoaderError> {
        let mut state = self.state.lock().await;

        let mut dir = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| LoaderError::io(format!("failed to read cache dir: {e}")))?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| LoaderError::io(format!("failed to read entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == BLOB_EXTENSION)
                && fs::remove_file(&path).await.is_err()
            {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }

        state.entries.clear();
        state.current_size = 0;
        state.dirty = true;
        self.write_index(&mut state).await;
        debug!("Cleared disk cache");
        Ok(())
    }

    /// Writes the index if access order changed since the last write.
    pub async fn flush(&self) {
        let mut state = self.state.lock().await;
        self.write_index(&mut state).await;
    }

    /// Returns the current cache size in bytes.
    pub async fn current_size(&self) -> u64 {
        self.state.lock().await.current_size
    }

    /// Returns the number of cached files.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Returns true if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn evict_to_budget(&self, state: &mut State) {
        if state.current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = state.current_size,
            max_size = self.max_size,
            "Disk cache over limit, evicting oldest entries"
        );

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        while state.current_size > self.max_size {
            let Some((name, entry)) = state.entries.pop_lru() else {
                break;
            };
            state.current_size -= entry.size;
            freed_size += entry.size;
            freed_count += 1;
            self.remove_blob(&name).await;
        }
        state.dirty = true;

        debug!(freed_size, freed_count, "Disk cache cleanup complete");
    }

    async fn remove_blob(&self, name: &str) {
        let path = self.blob_path(name);
        if let Err(e) = fs::remove_file(&path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }

    async fn write_index(&self, state: &mut State) {
        if !state.dirty {
            return;
        }

        let index = IndexFile {
            version: INDEX_VERSION,
            entries: state.entries.iter().rev().map(|(_, e)| e.clone()).collect(),
        };
        let json = match serde_json::to_vec(&index) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize disk cache index");
                return;
            }
        };

        let path = self.cache_dir.join(INDEX_FILE);
        let tmp_path = self.cache_dir.join(format!("{INDEX_FILE}.{TMP_EXTENSION}"));
        let result = async {
            fs::write(&tmp_path, &json).await?;
            fs::rename(&tmp_path, &path).await
        }
        .await;

        match result {
            Ok(()) => state.dirty = false,
            Err(e) => warn!(error = %e, "Failed to write disk cache index"),
        }
    }
}

impl std::fmt::Debug for DiskImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImageCache")
            .field("cache_dir", &self.cache_dir)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

async fn load_index(cache_dir: &Path) -> Option<Vec<IndexEntry>> {
    let raw = fs::read(cache_dir.join(INDEX_FILE)).await.ok()?;
    match serde_json::from_slice::<IndexFile>(&raw) {
        Ok(index) if index.version == INDEX_VERSION => Some(index.entries),
        Ok(index) => {
            warn!(version = index.version, "Unknown disk cache index version, rebuilding");
            None
        }
        Err(e) => {
            warn!(error = %e, "Corrupt disk cache index, rebuilding");
            None
        }
    }
}

/// Merges the stored index with the blobs actually on disk.
///
/// Indexed entries without a blob are dropped and the file size wins over the
/// recorded one. Unindexed blobs, left behind when the index write after a
/// `put_bytes` never landed, go first in modification order.
fn reconcile(indexed: Vec<IndexEntry>, blobs: Vec<IndexEntry>) -> Vec<IndexEntry> {
    let blob_count = blobs.len();
    let mut on_disk: HashMap<String, IndexEntry> = blobs
        .into_iter()
        .map(|blob| (blob.name.clone(), blob))
        .collect();

    let mut known = Vec::with_capacity(indexed.len());
    for mut entry in indexed {
        match on_disk.remove(&entry.name) {
            Some(blob) => {
                entry.size = blob.size;
                known.push(entry);
            }
            None => debug!(name = %entry.name, "Dropping index entry without blob"),
        }
    }

    let mut adopted: Vec<IndexEntry> = on_disk.into_values().collect();
    if !adopted.is_empty() {
        info!(count = adopted.len(), "Adopting blobs missing from the disk cache index");
        adopted.sort_by_key(|e| e.last_access_ms);
    }

    let mut entries = Vec::with_capacity(blob_count);
    entries.append(&mut adopted);
    entries.append(&mut known);
    entries
}

async fn scan_blobs(cache_dir: &Path) -> Result<Vec<IndexEntry>, LoaderError> {
    let mut dir = fs::read_dir(cache_dir)
        .await
        .map_err(|e| LoaderError::io(format!("failed to read cache dir: {e}")))?;

    let mut entries = Vec::new();
    while let Ok(Some(entry)) = dir.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == TMP_EXTENSION) {
            let _ = fs::remove_file(&path).await;
            continue;
        }
        if path.extension().is_none_or(|ext| ext != BLOB_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Ok(meta) = entry.metadata().await {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
            entries.push(IndexEntry {
                name: name.to_string(),
                url: String::new(),
                size: meta.len(),
                last_access_ms: modified,
            });
        }
    }

    entries.sort_by_key(|e| e.last_access_ms);
    Ok(entries)
}

#[derive(Debug, Clone)]
enum DiskState {
    Starting,
    Ready(Arc<DiskImageCache>),
    Unavailable,
}

/// Shared access to a disk cache that may still be opening.
///
/// The first caller waits until the background open finishes; later callers
/// pass straight through. If opening fails the tier stays inert for the rest
/// of the process and every call degrades to a miss.
#[derive(Debug, Clone)]
pub struct DiskCacheHandle {
    tx: Arc<watch::Sender<DiskState>>,
}

impl DiskCacheHandle {
    /// Starts opening the cache on a background task.
    #[must_use]
    pub fn spawn_open(cache_dir: PathBuf, max_size: u64) -> Self {
        let (tx, _rx) = watch::channel(DiskState::Starting);
        let tx = Arc::new(tx);
        let init_tx = tx.clone();

        tokio::spawn(async move {
            let state = match DiskImageCache::open(cache_dir.clone(), max_size).await {
                Ok(cache) => DiskState::Ready(Arc::new(cache)),
                Err(e) => {
                    warn!(path = %cache_dir.display(), error = %e, "Disk cache unavailable");
                    DiskState::Unavailable
                }
            };
            init_tx.send_replace(state);
        });

        Self { tx }
    }

    /// A handle whose disk tier is permanently off.
    #[must_use]
    pub fn disabled() -> Self {
        let (tx, _rx) = watch::channel(DiskState::Unavailable);
        Self { tx: Arc::new(tx) }
    }

    /// Returns true once the background open has finished, successfully or not.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(*self.tx.borrow(), DiskState::Starting)
    }

    /// Waits for initialization and returns the cache if it opened.
    pub async fn cache(&self) -> Option<Arc<DiskImageCache>> {
        let mut rx = self.tx.subscribe();
        let state = rx
            .wait_for(|s| !matches!(s, DiskState::Starting))
            .await
            .ok()?;
        match &*state {
            DiskState::Ready(cache) => Some(cache.clone()),
            DiskState::Starting | DiskState::Unavailable => None,
        }
    }

    /// Reads a blob, waiting for initialization first.
    pub async fn get_bytes(&self, key: &ImageKey) -> Option<Bytes> {
        self.cache().await?.get_bytes(key).await
    }

    /// Writes a blob, waiting for initialization first.
    ///
    /// # Errors
    /// Returns `DiskUnavailable` if the tier failed to open, or the write error.
    pub async fn put_bytes(&self, key: &ImageKey, bytes: &[u8]) -> Result<(), LoaderError> {
        let cache = self.cache().await.ok_or(LoaderError::DiskUnavailable)?;
        cache.put_bytes(key, bytes).await
    }

    /// Returns true if the blob is cached.
    pub async fn contains(&self, key: &ImageKey) -> bool {
        match self.cache().await {
            Some(cache) => cache.contains(key).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(name: &str) -> ImageKey {
        ImageKey::parse(&format!("https://example.com/{name}.jpg")).unwrap()
    }

    async fn create_test_cache(max_size: u64) -> (DiskImageCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), max_size)
            .await
            .unwrap();
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get_bytes() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        let data = b"test image data";

        cache.put_bytes(&key("a"), data).await.unwrap();
        let retrieved = cache.get_bytes(&key("a")).await.unwrap();

        assert_eq!(&retrieved[..], data);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;
        assert!(cache.get_bytes(&key("missing")).await.is_none());
    }

    #[tokio::test]
    async fn test_counters_track_overwrite_and_evict() {
        let (cache, _temp) = create_test_cache(1024 * 1024).await;

        cache.put_bytes(&key("a"), b"hello").await.unwrap();
        cache.put_bytes(&key("b"), b"world!").await.unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size().await, 11);

        cache.put_bytes(&key("a"), b"hey").await.unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size().await, 9);

        cache.evict(&key("b")).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.current_size().await, 3);
        assert!(!cache.contains(&key("b")).await);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
        assert_eq!(cache.current_size().await, 0);
    }

    #[tokio::test]
    async fn test_oldest_entries_evicted_first() {
        let (cache, _temp) = create_test_cache(10).await;

        cache.put_bytes(&key("a"), b"1234").await.unwrap();
        cache.put_bytes(&key("b"), b"1234").await.unwrap();
        cache.put_bytes(&key("c"), b"1234").await.unwrap();

        assert!(!cache.contains(&key("a")).await);
        assert!(cache.contains(&key("b")).await);
        assert!(cache.contains(&key("c")).await);
        assert_eq!(cache.current_size().await, 8);
    }

    #[tokio::test]
    async fn test_read_refreshes_recency() {
        let (cache, _temp) = create_test_cache(10).await;

        cache.put_bytes(&key("a"), b"1234").await.unwrap();
        cache.put_bytes(&key("b"), b"1234").await.unwrap();
        let _ = cache.get_bytes(&key("a")).await;
        cache.put_bytes(&key("c"), b"1234").await.unwrap();

        assert!(cache.contains(&key("a")).await);
        assert!(!cache.contains(&key("b")).await);
    }

    #[tokio::test]
    async fn test_budget_never_exceeded() {
        let (cache, _temp) = create_test_cache(1000).await;

        for i in 0..40u8 {
            let blob = vec![i; 50 + usize::from(i) * 7];
            cache.put_bytes(&key(&i.to_string()), &blob).await.unwrap();
            assert!(cache.current_size().await <= 1000);
        }
    }

    #[tokio::test]
    async fn test_oversized_blob_rejected() {
        let (cache, _temp) = create_test_cache(4).await;

        let result = cache.put_bytes(&key("big"), b"12345").await;
        assert!(matches!(result, Err(LoaderError::Io { .. })));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&key("a"), b"persisted").await.unwrap();
            cache.put_bytes(&key("b"), b"also").await.unwrap();
        }

        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size().await, 13);
        assert_eq!(&cache.get_bytes(&key("a")).await.unwrap()[..], b"persisted");
    }

    #[tokio::test]
    async fn test_reopen_with_smaller_budget_keeps_newest() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&key("old"), b"1234").await.unwrap();
            cache.put_bytes(&key("new"), b"5678").await.unwrap();
        }

        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 5)
            .await
            .unwrap();
        assert!(!cache.contains(&key("old")).await);
        assert!(cache.contains(&key("new")).await);
    }

    #[tokio::test]
    async fn test_corrupt_index_is_rebuilt_from_blobs() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&key("a"), b"blob").await.unwrap();
        }
        std::fs::write(temp_dir.path().join(INDEX_FILE), b"{ not json").unwrap();

        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(&cache.get_bytes(&key("a")).await.unwrap()[..], b"blob");
    }

    #[tokio::test]
    async fn test_unindexed_blob_counts_against_budget() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 10)
                .await
                .unwrap();
            cache.put_bytes(&key("a"), b"1234").await.unwrap();
        }
        let stray = temp_dir.path().join(format!("{}.img", key("b").disk_name()));
        std::fs::write(&stray, b"12345678").unwrap();

        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 10)
            .await
            .unwrap();
        for name in ["c", "d", "e", "f", "g"] {
            cache.put_bytes(&key(name), b"123").await.unwrap();
        }

        let on_disk: u64 = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "img"))
            .map(|path| std::fs::metadata(path).unwrap().len())
            .sum();
        assert_eq!(on_disk, cache.current_size().await);
        assert!(on_disk <= 10);
        assert!(!stray.exists());
    }

    #[tokio::test]
    async fn test_unindexed_blob_is_adopted() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
                .await
                .unwrap();
            cache.put_bytes(&key("a"), b"indexed").await.unwrap();
        }
        let stray = temp_dir.path().join(format!("{}.img", key("b").disk_name()));
        std::fs::write(&stray, b"stray").unwrap();

        let cache = DiskImageCache::open(temp_dir.path().to_path_buf(), 1024)
            .await
            .unwrap();

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.current_size().await, 12);
        assert_eq!(&cache.get_bytes(&key("b")).await.unwrap()[..], b"stray");
    }

    #[tokio::test]
    async fn test_missing_blob_is_a_miss() {
        let (cache, temp) = create_test_cache(1024).await;
        cache.put_bytes(&key("a"), b"blob").await.unwrap();

        let blob = temp.path().join(format!("{}.img", key("a").disk_name()));
        std::fs::remove_file(blob).unwrap();

        assert!(cache.get_bytes(&key("a")).await.is_none());
        assert!(cache.is_empty().await);
        assert_eq!(cache.current_size().await, 0);
    }

    #[tokio::test]
    async fn test_recreates_deleted_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("images");
        let cache = DiskImageCache::open(dir.clone(), 1024).await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
        cache.put_bytes(&key("a"), b"again").await.unwrap();

        assert!(dir.exists());
        assert_eq!(&cache.get_bytes(&key("a")).await.unwrap()[..], b"again");
    }

    #[tokio::test]
    async fn test_handle_waits_for_background_open() {
        let temp_dir = TempDir::new().unwrap();
        let handle = DiskCacheHandle::spawn_open(temp_dir.path().join("cache"), 1024);

        handle.put_bytes(&key("a"), b"bytes").await.unwrap();
        assert!(handle.is_initialized());
        assert_eq!(&handle.get_bytes(&key("a")).await.unwrap()[..], b"bytes");
    }

    #[tokio::test]
    async fn test_handle_failed_open_is_inert() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let handle = DiskCacheHandle::spawn_open(file, 1024);

        assert!(handle.get_bytes(&key("a")).await.is_none());
        let result = handle.put_bytes(&key("a"), b"bytes").await;
        assert!(matches!(result, Err(LoaderError::DiskUnavailable)));
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_disabled_handle() {
        let handle = DiskCacheHandle::disabled();
        assert!(handle.is_initialized());
        assert!(!handle.contains(&key("a")).await);
    }
}
