//! Domain entity definitions.

mod image;
mod target;

pub use self::image::{DecodedImage, ImageKey, ImageSource, LoadedImage};
pub use target::TargetId;
