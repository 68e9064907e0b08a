//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{DecodedImage, ImageKey, ImageSource, TargetId};
pub use errors::{FeedError, LoaderError};
pub use ports::{DisplayTarget, FeedPort, ImageFetcherPort};
