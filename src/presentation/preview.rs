//! Full-screen preview of a single photo.

use tracing::debug;

use crate::domain::entities::{DecodedImage, ImageKey, TargetId};
use crate::domain::errors::LoaderError;
use crate::domain::ports::DisplayTarget;
use crate::infrastructure::image::{ImageLoader, LoadDispatch};

/// A screen-sized display target.
#[derive(Debug)]
pub struct PreviewPane {
    id: TargetId,
    width: u32,
    height: u32,
    painted: Option<(ImageKey, DecodedImage)>,
    open: bool,
}

impl PreviewPane {
    /// Creates a closed pane of the given screen size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: TargetId::next(),
            width,
            height,
            painted: None,
            open: false,
        }
    }

    /// Opens the pane on `url`.
    ///
    /// # Errors
    /// Returns the loader's error if the request is rejected.
    pub fn open(&mut self, url: &str, loader: &ImageLoader) -> Result<LoadDispatch, LoaderError> {
        debug!(url = %url, "Opening preview");
        self.open = true;
        loader.load(self, url)
    }

    /// Closes the pane and drops its image.
    pub fn close(&mut self, loader: &ImageLoader) {
        self.open = false;
        self.painted = None;
        loader.release_target(self.id);
    }

    /// Returns true if the pane is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
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
}

impl DisplayTarget for PreviewPane {
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
    }
}
