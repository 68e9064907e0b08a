mod display_target;
mod feed_port;
mod image_fetcher_port;

pub use display_target::DisplayTarget;
pub use feed_port::FeedPort;
pub use image_fetcher_port::ImageFetcherPort;

#[cfg(test)]
pub mod mocks {
    pub use super::feed_port::MockFeedPort;
    pub use super::image_fetcher_port::mock::{MockImageFetcher, png_bytes};
}
