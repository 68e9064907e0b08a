//! Port implemented by UI elements that can show an image.

use crate::domain::entities::{DecodedImage, ImageKey, TargetId};

/// A UI element the loader paints into.
///
/// Targets live on the UI-owning task. The loader never stores them, only
/// their [`TargetId`].
pub trait DisplayTarget {
    /// Stable id of this element.
    fn id(&self) -> TargetId;

    /// Current laid-out size as `(width, height)`; `(0, 0)` before layout.
    fn dimensions(&self) -> (u32, u32);

    /// Removes whatever the element currently shows.
    fn clear(&mut self);

    /// Shows `image`, which was loaded for `key`.
    fn show(&mut self, key: &ImageKey, image: DecodedImage);
}
