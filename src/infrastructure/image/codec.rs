//! Bounded decoding and power-of-two downsampling.
//!
//! Images are decoded no smaller than the requested box: the subsample factor
//! is the largest power of two that keeps both sides at or above the bound.
//! This trades some memory for quality instead of fitting exactly.
//!
//! The `image` decoders cannot subsample while decoding, so the full-size
//! bitmap exists briefly before it is shrunk. The decode is bounded by
//! [`MAX_DECODE_ALLOC`] instead, and sources that would need more are
//! rejected before any pixels are allocated.

use std::io::Cursor;

use image::{ImageReader, Limits};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::trace;

use crate::domain::entities::DecodedImage;
use crate::domain::errors::LoaderError;

/// Quality used when re-encoding decoded pixels for the disk tier.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Largest allocation a single full-size decode may make (256 MB).
pub const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// Computes the subsample factor for a `width`x`height` source and a
/// `req_width`x`req_height` bound.
///
/// Returns 1 when the source already fits or when either bound is zero.
#[must_use]
pub fn calculate_sample_size(width: u32, height: u32, req_width: u32, req_height: u32) -> u32 {
    if req_width == 0 || req_height == 0 {
        return 1;
    }

    let mut sample_size = 1;
    if height > req_height || width > req_width {
        let half_height = height / 2;
        let half_width = width / 2;

        while half_height / sample_size >= req_height && half_width / sample_size >= req_width {
            sample_size *= 2;
        }
    }
    sample_size
}

/// Reads only the image header and returns `(width, height)`.
///
/// # Errors
/// Returns `Decode` if the format is unknown or the header is unreadable.
pub fn read_dimensions(bytes: &[u8]) -> Result<(u32, u32), LoaderError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LoaderError::decode(format!("failed to sniff format: {e}")))?
        .into_dimensions()
        .map_err(|e| LoaderError::decode(format!("failed to read dimensions: {e}")))
}

/// Decodes `bytes`, subsampled so the result is not much larger than
/// `max_width`x`max_height`.
///
/// A zero bound means the target has no size yet; the image is then decoded
/// at its full size. Peak memory is the full-size bitmap, capped by
/// [`MAX_DECODE_ALLOC`].
///
/// # Errors
/// Returns `Decode` if the bytes are not a supported image or decoding them
/// would exceed the allocation cap.
pub fn decode_bounded(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
) -> Result<DecodedImage, LoaderError> {
    decode_with_limit(bytes, max_width, max_height, MAX_DECODE_ALLOC)
}

fn decode_with_limit(
    bytes: &[u8],
    max_width: u32,
    max_height: u32,
    max_alloc: u64,
) -> Result<DecodedImage, LoaderError> {
    let (width, height) = read_dimensions(bytes)?;
    let sample_size = calculate_sample_size(width, height, max_width, max_height);

    let mut limits = Limits::default();
    limits.max_alloc = Some(max_alloc);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LoaderError::decode(format!("failed to sniff format: {e}")))?;
    reader.limits(limits);
    let decoded = reader
        .decode()
        .map_err(|e| LoaderError::decode(format!("failed to decode image: {e}")))?;

    trace!(
        width,
        height,
        max_width,
        max_height,
        sample_size,
        "Decoded image"
    );

    Ok(DecodedImage::new(subsample(decoded, sample_size)))
}

/// Scales an already decoded image for a `width`x`height` target using the
/// same subsampling rule as [`decode_bounded`].
///
/// Returns the same pixel buffer when no scaling is needed.
#[must_use]
pub fn scale_to_fit(image: &DecodedImage, width: u32, height: u32) -> DecodedImage {
    let sample_size = calculate_sample_size(image.width(), image.height(), width, height);
    if sample_size == 1 {
        return image.clone();
    }
    DecodedImage::new(subsample(image.pixels().clone(), sample_size))
}

/// Re-encodes decoded pixels as JPEG.
///
/// # Errors
/// Returns `Decode` if encoding fails.
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, LoaderError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    image::DynamicImage::ImageRgb8(image.pixels().to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| LoaderError::decode(format!("failed to encode jpeg: {e}")))?;
    Ok(buf)
}

fn subsample(image: image::DynamicImage, sample_size: u32) -> image::DynamicImage {
    if sample_size <= 1 {
        return image;
    }
    let width = (image.width() / sample_size).max(1);
    let height = (image.height() / sample_size).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}
