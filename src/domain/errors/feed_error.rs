//! Photo feed error types.

use thiserror::Error;

/// Feed retrieval error variants.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FeedError {
    #[error("network error while fetching feed: {message}")]
    Network { message: String },

    #[error("feed rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed feed payload: {message}")]
    Malformed { message: String },
}

impl FeedError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates malformed payload error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Returns whether error is network related.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
