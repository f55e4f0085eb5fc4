//! Shared helpers for the workspace behavior tests.

use marketpulse_core::{EventTime, NewsItem, PriceBar, Ticker};
use marketpulse_warehouse::{Warehouse, WarehouseConfig};

pub fn temp_warehouse() -> (tempfile::TempDir, Warehouse) {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = WarehouseConfig::new(dir.path().join("tests.duckdb"));
    let warehouse = Warehouse::open(&config).expect("open warehouse");
    (dir, warehouse)
}

pub fn ticker(symbol: &str) -> Ticker {
    Ticker::parse(symbol).expect("valid ticker")
}

pub fn bar(symbol: &str, day: time::Date, close: f64) -> PriceBar {
    PriceBar::new(
        ticker(symbol),
        day,
        Some(close - 1.0),
        Some(close + 1.0),
        Some(close - 2.0),
        close,
        1_000,
    )
    .expect("valid bar")
}

/// An ISO timestamp `hours_ago` hours before now, in the storage format.
/// Day-window queries cut off relative to the current date, so seeds must
/// be anchored to now.
pub fn recent_timestamp(hours_ago: i64) -> String {
    EventTime::from_offset_datetime(
        time::OffsetDateTime::now_utc() - time::Duration::hours(hours_ago),
    )
    .format_iso_no_tz()
}

pub fn news(url: &str, headline: &str, published_at: &str, source: &str) -> NewsItem {
    NewsItem::new(
        headline.to_owned(),
        EventTime::parse_flexible(published_at).expect("valid timestamp"),
        source.to_owned(),
        url.to_owned(),
    )
    .expect("valid item")
}
