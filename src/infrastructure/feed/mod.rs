//! Photo feed client.

mod client;
mod dto;

pub use client::{FeedClient, flatten_feed};
