//! Core contracts for marketpulse.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - Raw upstream payload types
//! - Normalizers that turn raw payloads into canonical rows
//! - Fetch orchestration over the upstream feed traits

pub mod domain;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod raw;

pub use domain::{EventTime, NewsItem, PriceBar, Ticker};
pub use error::ValidationError;
pub use fetch::{
    ArticlePage, FetchError, FetchProfile, HttpNewsFeed, HttpPriceFeed, NewsFeed, NewsFetcher,
    NewsRun, PriceFeed, PriceFetcher, PriceRun, RetryOnce, PAGE_SIZE,
};
pub use normalize::{normalize_article, normalize_price_table, NewsBatch, PriceTableError};
pub use raw::{RawArticle, RawColumn, RawPriceTable, RawSource};
