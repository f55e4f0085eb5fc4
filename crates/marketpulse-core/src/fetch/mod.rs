//! Upstream feed clients and fetch orchestration.

mod news;
mod orchestrator;
mod prices;
mod retry;

use thiserror::Error;

pub use news::{ArticlePage, HttpNewsFeed, NewsFeed, PAGE_SIZE};
pub use orchestrator::{FetchProfile, NewsFetcher, NewsRun, PriceFetcher, PriceRun};
pub use prices::{HttpPriceFeed, PriceFeed};
pub use retry::RetryOnce;

/// Failure modes of a single upstream call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure. Timeouts and connection errors are retryable;
    /// request construction errors are not.
    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },

    /// The provider signalled its quota is exhausted. Never retried; the
    /// whole run is expected to stop.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider returned a non-ok application status.
    #[error("api error {code}: {message}")]
    Api { code: String, message: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }
}
