//! The set of display targets owned by the UI task.

use crate::domain::entities::TargetId;
use crate::domain::ports::DisplayTarget;
use crate::infrastructure::image::ImageLoader;

use super::grid::PhotoGrid;
use super::preview::PreviewPane;

/// Grid plus preview pane.
#[derive(Debug)]
pub struct PhotoScreen {
    /// The scrolling grid.
    pub grid: PhotoGrid,
    /// The full-screen preview.
    pub preview: PreviewPane,
}

impl PhotoScreen {
    /// Creates a screen.
    #[must_use]
    pub const fn new(grid: PhotoGrid, preview: PreviewPane) -> Self {
        Self { grid, preview }
    }

    /// Looks up a target by id.
    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut dyn DisplayTarget> {
        if self.preview.id() == id {
            return Some(&mut self.preview);
        }
        self.grid
            .cell_mut(id)
            .map(|cell| cell as &mut dyn DisplayTarget)
    }

    /// Releases every target from the loader.
    pub fn release_all(&mut self, loader: &ImageLoader) {
        self.grid.release_all(loader);
        self.preview.close(loader);
    }
}
