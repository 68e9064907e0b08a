//! Headless photo grid.
//!
//! A fixed window of `columns x rows` cells that is rebound to a different
//! slice of the URL list when scrolled, the way recycled list cells are.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::entities::{DecodedImage, ImageKey, TargetId};
use crate::domain::errors::LoaderError;
use crate::domain::ports::DisplayTarget;
use crate::infrastructure::image::{FetchOutcome, ImageLoader, LoadDispatch};

/// One display cell. Records what it was last painted with.
#[derive(Debug)]
pub struct GridCell {
    id: TargetId,
    width: u32,
    height: u32,
    painted: Option<(ImageKey, DecodedImage)>,
    paint_count: usize,
}

impl GridCell {
    /// Creates an empty cell of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: TargetId::next(),
            width,
            height,
            painted: None,
            paint_count: 0,
        }
    }

    /// Key of the image currently shown.
    #[must_use]
    pub fn painted_key(&self) -> Option<&ImageKey> {
        self.painted.as_ref().map(|(key, _)| key)
    }

    /// Image currently shown.
    #[must_use]
    pub fn painted_image(&self) -> Option<&DecodedImage> {
        self.painted.as_ref().map(|(_, image)| image)
    }

    /// Returns true if the cell shows nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.painted.is_none()
    }

    /// Number of times the cell has been painted.
    #[must_use]
    pub const fn paint_count(&self) -> usize {
        self.paint_count
    }
}

impl DisplayTarget for GridCell {
    fn id(&self) -> TargetId {
        self.id
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.painted = None;
    }

    fn show(&mut self, key: &ImageKey, image: DecodedImage) {
        self.painted = Some((key.clone(), image));
        self.paint_count += 1;
    }
}

/// Outcome of binding a batch of cells.
#[derive(Debug, Default)]
pub struct BindReport {
    /// Cells painted synchronously from memory.
    pub painted: usize,
    /// Worker handles for cells that missed memory.
    pub queued: Vec<JoinHandle<FetchOutcome>>,
    /// Cells whose URL was rejected.
    pub rejected: usize,
}

impl BindReport {
    fn record(&mut self, result: Result<LoadDispatch, LoaderError>) -> bool {
        match result {
            Ok(LoadDispatch::Painted) => self.painted += 1,
            Ok(LoadDispatch::Queued(handle)) => self.queued.push(handle),
            Err(_) => {
                self.rejected += 1;
                return false;
            }
        }
        true
    }
}

/// A scrolling grid of cells over a list of image URLs.
#[derive(Debug)]
pub struct PhotoGrid {
    columns: usize,
    rows: usize,
    cells: Vec<GridCell>,
    urls: Vec<String>,
    first_row: usize,
}

impl PhotoGrid {
    /// Creates a grid of `columns x rows` cells, each `cell_width x cell_height`.
    #[must_use]
    pub fn new(columns: usize, rows: usize, cell_width: u32, cell_height: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let cells = (0..columns * rows)
            .map(|_| GridCell::new(cell_width, cell_height))
            .collect();
        Self {
            columns,
            rows,
            cells,
            urls: Vec::new(),
            first_row: 0,
        }
    }

    /// Replaces the URL list and scrolls back to the top. Call
    /// [`PhotoGrid::bind_visible`] afterwards.
    pub fn set_urls(&mut self, urls: Vec<String>) {
        self.urls = urls;
        self.first_row = 0;
    }

    /// The URL list.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// All cells, in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// The cell with `id`, if it belongs to this grid.
    pub fn cell_mut(&mut self, id: TargetId) -> Option<&mut GridCell> {
        self.cells.iter_mut().find(|cell| cell.id == id)
    }

    /// First visible row.
    #[must_use]
    pub const fn first_row(&self) -> usize {
        self.first_row
    }

    /// Number of rows needed to show every URL.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.urls.len().div_ceil(self.columns)
    }

    /// Largest valid first row.
    #[must_use]
    pub fn max_first_row(&self) -> usize {
        self.total_rows().saturating_sub(self.rows)
    }

    /// URL each cell should show at the current scroll position.
    #[must_use]
    pub fn visible_urls(&self) -> Vec<Option<&str>> {
        let start = self.first_row * self.columns;
        (0..self.cells.len())
            .map(|i| self.urls.get(start + i).map(String::as_str))
            .collect()
    }

    /// Binds every cell to its URL at the current scroll position.
    ///
    /// Cells past the end of the list are cleared and released.
    pub fn bind_visible(&mut self, loader: &ImageLoader) -> BindReport {
        let start = self.first_row * self.columns;
        let mut report = BindReport::default();

        for (i, cell) in self.cells.iter_mut().enumerate() {
            match self.urls.get(start + i) {
                Some(url) => {
                    let result = loader.load(cell, url);
                    if let Err(e) = &result {
                        warn!(url = %url, error = %e, "Cannot load cell image");
                    }
                    if !report.record(result) {
                        cell.clear();
                        loader.release_target(cell.id);
                    }
                }
                None => {
                    cell.clear();
                    loader.release_target(cell.id);
                }
            }
        }

        debug!(
            first_row = self.first_row,
            painted = report.painted,
            queued = report.queued.len(),
            "Bound visible cells"
        );
        report
    }

    /// Scrolls so `row` is the first visible row, clamped, and rebinds.
    pub fn scroll_to(&mut self, row: usize, loader: &ImageLoader) -> BindReport {
        self.first_row = row.min(self.max_first_row());
        self.bind_visible(loader)
    }

    /// Scrolls by `delta` rows and rebinds.
    pub fn scroll_by(&mut self, delta: isize, loader: &ImageLoader) -> BindReport {
        let row = self.first_row.saturating_add_signed(delta);
        self.scroll_to(row, loader)
    }

    /// Releases every cell from the loader.
    pub fn release_all(&mut self, loader: &ImageLoader) {
        for cell in &mut self.cells {
            cell.clear();
            loader.release_target(cell.id);
        }
    }
}
