//! Domain types for image handling.

use std::sync::Arc;

use crate::domain::errors::LoaderError;

/// Canonical identity of a remote image.
///
/// The same key addresses the memory cache, the disk cache and in-flight
/// requests, so two spellings of one URL must normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey(String);

impl ImageKey {
    /// Normalizes a URL into a key.
    ///
    /// Surrounding whitespace is trimmed, the scheme and host are lower-cased
    /// and any `#fragment` is dropped.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the URL is blank or has no scheme or host.
    pub fn parse(url: &str) -> Result<Self, LoaderError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(LoaderError::invalid_argument("image url must not be empty"));
        }

        let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);

        let Some((scheme, rest)) = without_fragment.split_once("://") else {
            return Err(LoaderError::invalid_argument(format!(
                "image url has no scheme: {trimmed}"
            )));
        };
        if scheme.is_empty() || rest.is_empty() {
            return Err(LoaderError::invalid_argument(format!(
                "image url is incomplete: {trimmed}"
            )));
        }

        let (host, tail) = rest
            .find(['/', '?'])
            .map_or((rest, ""), |idx| rest.split_at(idx));
        if host.is_empty() {
            return Err(LoaderError::invalid_argument(format!(
                "image url has no host: {trimmed}"
            )));
        }

        Ok(Self(format!(
            "{}://{}{}",
            scheme.to_ascii_lowercase(),
            host.to_ascii_lowercase(),
            tail
        )))
    }

    /// Returns the normalized URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the stable file name stem used by the disk cache.
    #[must_use]
    pub fn disk_name(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded pixel buffer together with its memory footprint.
///
/// Cloning is cheap: the pixels are shared. They are freed once no cache
/// entry and no display target holds a clone.
#[derive(Clone)]
pub struct DecodedImage {
    pixels: Arc<image::DynamicImage>,
    byte_count: usize,
}

impl DecodedImage {
    /// Wraps a decoded image.
    #[must_use]
    pub fn new(pixels: image::DynamicImage) -> Self {
        let byte_count = pixels.as_bytes().len();
        Self {
            pixels: Arc::new(pixels),
            byte_count,
        }
    }

    /// Returns the underlying pixels.
    #[must_use]
    pub fn pixels(&self) -> &image::DynamicImage {
        &self.pixels
    }

    /// Returns the width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Returns the height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Returns the decoded size in bytes.
    #[must_use]
    pub const fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Returns the decoded size in kilobytes, rounded up.
    ///
    /// Never zero, so tiny images still count against the memory budget.
    #[must_use]
    pub fn footprint_kb(&self) -> usize {
        self.byte_count.div_ceil(1024).max(1)
    }

    /// Returns true if both values share the same pixel buffer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("byte_count", &self.byte_count)
            .finish()
    }
}

/// Where an image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Loaded from the in-memory LRU cache.
    Memory,
    /// Loaded from the disk cache.
    Disk,
    /// Downloaded from the network.
    Network,
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// An image resolved by the loader, tagged with its origin.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// The image key.
    pub key: ImageKey,
    /// The decoded image.
    pub image: DecodedImage,
    /// Which tier produced it.
    pub source: ImageSource,
}
