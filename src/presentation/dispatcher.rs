//! Applies loader results on the UI-owning task.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageSource;
use crate::infrastructure::image::{FetchOutcome, ImageLoader, ImageReadyEvent, PaintOutcome};

use super::screen::PhotoScreen;

/// Tally of a batch of loads.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    /// Events painted onto their target.
    pub painted: usize,
    /// Events discarded at paint time.
    pub stale: usize,
    /// Workers that found their target rebound.
    pub superseded: usize,
    /// Workers that failed.
    pub failed: usize,
    /// Worker results served from the memory cache.
    pub from_memory: usize,
    /// Worker results served from the disk cache.
    pub from_disk: usize,
    /// Worker results fetched from the network.
    pub from_network: usize,
}

impl SettleReport {
    fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Delivered(ImageSource::Memory) => self.from_memory += 1,
            FetchOutcome::Delivered(ImageSource::Disk) => self.from_disk += 1,
            FetchOutcome::Delivered(ImageSource::Network) => self.from_network += 1,
            FetchOutcome::Superseded => self.superseded += 1,
            FetchOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Receives [`ImageReadyEvent`]s and paints them onto the screen.
#[derive(Debug)]
pub struct UiDispatcher {
    events: mpsc::UnboundedReceiver<ImageReadyEvent>,
}

impl UiDispatcher {
    /// Creates a dispatcher over the loader's event channel.
    #[must_use]
    pub const fn new(events: mpsc::UnboundedReceiver<ImageReadyEvent>) -> Self {
        Self { events }
    }

    /// Routes one event to its target.
    pub fn dispatch(
        loader: &ImageLoader,
        screen: &mut PhotoScreen,
        event: ImageReadyEvent,
    ) -> PaintOutcome {
        match screen.target_mut(event.target) {
            Some(target) => loader.deliver(event, target),
            None => {
                trace!(target = %event.target, "Event for a target no longer on screen");
                PaintOutcome::Stale
            }
        }
    }

    /// Waits for `handles` to finish, then applies the resulting events.
    ///
    /// Workers send their event before finishing, so every result of the
    /// batch is queued once all handles resolve.
    pub async fn settle(
        &mut self,
        loader: &ImageLoader,
        screen: &mut PhotoScreen,
        handles: Vec<JoinHandle<FetchOutcome>>,
    ) -> SettleReport {
        let mut report = SettleReport::default();

        for handle in handles {
            match handle.await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    warn!(error = %e, "Image worker panicked");
                    report.failed += 1;
                }
            }
        }

        while let Ok(event) = self.events.try_recv() {
            match Self::dispatch(loader, screen, event) {
                PaintOutcome::Painted => report.painted += 1,
                PaintOutcome::Stale => report.stale += 1,
            }
        }

        debug!(?report, "Settled image batch");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ImageKey;
    use crate::domain::ports::mocks::MockImageFetcher;
    use crate::infrastructure::image::{DiskCacheHandle, ImageLoaderConfig, LoadDispatch};
    use crate::presentation::grid::PhotoGrid;
    use crate::presentation::preview::PreviewPane;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        loader: ImageLoader,
        dispatcher: UiDispatcher,
        screen: PhotoScreen,
        fetcher: Arc<MockImageFetcher>,
        urls: Vec<String>,
        _temp: TempDir,
    }

    fn feed_urls(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://images.example.com/photo-{i}.jpg"))
            .collect()
    }

    fn fixture(count: usize) -> Fixture {
        let urls = feed_urls(count);
        let fetcher = Arc::new(
            MockImageFetcher::new().with_pngs(urls.iter().map(String::as_str), 120, 90),
        );
        let temp = TempDir::new().unwrap();
        let disk = DiskCacheHandle::spawn_open(temp.path().join("images"), 10 * 1024 * 1024);
        let (tx, rx) = mpsc::unbounded_channel();
        let config = ImageLoaderConfig {
            memory_cache_kb: 64 * 1024,
            screen_width: 240,
            screen_height: 320,
            ..ImageLoaderConfig::default()
        };
        let loader = ImageLoader::new(config, fetcher.clone(), disk, tx);

        let mut grid = PhotoGrid::new(3, 4, 60, 60);
        grid.set_urls(urls.clone());

        Fixture {
            loader,
            dispatcher: UiDispatcher::new(rx),
            screen: PhotoScreen::new(grid, PreviewPane::new(240, 320)),
            fetcher,
            urls,
            _temp: temp,
        }
    }

    fn assert_cells_match(screen: &PhotoScreen) {
        for (cell, url) in screen.grid.cells().iter().zip(screen.grid.visible_urls()) {
            let expected = url.map(|u| ImageKey::parse(u).unwrap());
            assert_eq!(cell.painted_key(), expected.as_ref());
        }
    }

    #[tokio::test]
    async fn test_scrolling_feed_paints_every_cell_and_reuses_cache() {
        let mut f = fixture(30);

        for row in 0..=f.screen.grid.max_first_row() {
            let bind = f.screen.grid.scroll_to(row, &f.loader);
            assert_eq!(bind.rejected, 0);
            let report = f
                .dispatcher
                .settle(&f.loader, &mut f.screen, bind.queued)
                .await;
            assert_eq!(report.failed, 0);
            assert_cells_match(&f.screen);
        }

        for url in &f.urls {
            assert_eq!(f.fetcher.fetch_count(url), 1, "{url} fetched more than once");
        }

        let bind = f.screen.grid.scroll_to(0, &f.loader);
        assert_eq!(bind.painted, 12);
        assert!(bind.queued.is_empty());
        assert_cells_match(&f.screen);
        assert_eq!(f.fetcher.total_fetches(), 30);
    }

    #[tokio::test]
    async fn test_fast_scroll_never_shows_wrong_image() {
        let mut f = fixture(30);
        for url in &f.urls {
            f.fetcher.hold(url);
        }

        let first = f.screen.grid.bind_visible(&f.loader);
        let second = f.screen.grid.scroll_to(3, &f.loader);
        let third = f.screen.grid.scroll_to(6, &f.loader);
        for url in &f.urls {
            f.fetcher.release(url);
        }

        let mut handles = first.queued;
        handles.extend(second.queued);
        handles.extend(third.queued);
        let report = f.dispatcher.settle(&f.loader, &mut f.screen, handles).await;

        assert_eq!(report.failed, 0);
        assert_cells_match(&f.screen);
        assert_eq!(f.loader.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_reuses_grid_image() {
        let mut f = fixture(6);

        let bind = f.screen.grid.bind_visible(&f.loader);
        f.dispatcher.settle(&f.loader, &mut f.screen, bind.queued).await;

        let url = f.urls[2].clone();
        let dispatch = f.screen.preview.open(&url, &f.loader).unwrap();

        assert!(matches!(dispatch, LoadDispatch::Painted));
        assert!(f.screen.preview.is_open());
        let image = f.screen.preview.painted_image().unwrap();
        assert!(image.width() <= 240 && image.height() <= 320);
        assert_eq!(f.fetcher.fetch_count(&url), 1);

        f.screen.preview.close(&f.loader);
        assert!(f.screen.preview.painted_key().is_none());
    }

    #[tokio::test]
    async fn test_released_cells_ignore_late_results() {
        let mut f = fixture(3);
        f.fetcher.hold(&f.urls[0]);

        let bind = f.screen.grid.bind_visible(&f.loader);
        f.screen.release_all(&f.loader);
        f.fetcher.release(&f.urls[0]);

        let report = f.dispatcher.settle(&f.loader, &mut f.screen, bind.queued).await;

        assert_eq!(report.painted, 0);
        assert!(f.screen.grid.cells().iter().all(|cell| cell.is_empty()));
    }

    #[tokio::test]
    async fn test_cells_past_feed_end_stay_empty() {
        let mut f = fixture(5);

        let bind = f.screen.grid.bind_visible(&f.loader);
        let report = f.dispatcher.settle(&f.loader, &mut f.screen, bind.queued).await;

        assert_eq!(report.painted, 5);
        let cells = f.screen.grid.cells();
        assert!(cells[..5].iter().all(|cell| !cell.is_empty()));
        assert!(cells[5..].iter().all(|cell| cell.is_empty()));
    }
}
