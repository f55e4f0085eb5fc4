//! Normalizers that turn raw upstream payloads into canonical rows.

mod news;
mod prices;

pub use news::{normalize_article, NewsBatch};
pub use prices::{normalize_price_table, PriceTableError};
