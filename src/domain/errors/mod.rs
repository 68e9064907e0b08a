//! Domain error types.

mod feed_error;
mod loader_error;

pub use feed_error::FeedError;
pub use loader_error::LoaderError;
