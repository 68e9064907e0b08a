//! Use case implementations.

mod load_feed_use_case;

pub use load_feed_use_case::LoadFeedUseCase;
