//! Photogrid - a photo feed grid backed by a shared image loader.
//!
//! The loader fetches images over HTTP, decodes them at bounded size and keeps
//! them in a memory cache and a disk cache so that recycled grid cells can
//! show previously loaded images without fetching or decoding them again.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing display targets and event dispatch.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "photogrid";
