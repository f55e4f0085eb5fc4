use ::duckdb::{params, Connection};
use marketpulse_core::{NewsItem, PriceBar};

use crate::WarehouseError;

// The conflict predicate compares through sentinels so that a row identical
// to what is stored counts as unchanged. -1 can never be a real price or
// volume after normalization, and '' can never be a stored headline or
// timestamp.
const STOCKS_UPSERT: &str = r#"
INSERT INTO stocks (ticker, date, open, high, low, close, volume)
VALUES (?, CAST(? AS DATE), ?, ?, ?, ?, ?)
ON CONFLICT (ticker, date) DO UPDATE SET
    open = excluded.open,
    high = excluded.high,
    low = excluded.low,
    close = excluded.close,
    volume = excluded.volume
WHERE COALESCE(stocks.open, -1.0) != COALESCE(excluded.open, -1.0)
   OR COALESCE(stocks.high, -1.0) != COALESCE(excluded.high, -1.0)
   OR COALESCE(stocks.low, -1.0) != COALESCE(excluded.low, -1.0)
   OR stocks.close != excluded.close
   OR COALESCE(stocks.volume, -1) != COALESCE(excluded.volume, -1)
"#;

const NEWS_UPSERT: &str = r#"
INSERT INTO news (id, headline, published_at, source, url)
VALUES (nextval('news_id_seq'), ?, ?, ?, ?)
ON CONFLICT (url) DO UPDATE SET
    headline = excluded.headline,
    published_at = excluded.published_at,
    source = excluded.source
WHERE COALESCE(news.headline, '') != COALESCE(excluded.headline, '')
   OR COALESCE(news.published_at, '') != COALESCE(excluded.published_at, '')
   OR COALESCE(news.source, '') != COALESCE(excluded.source, '')
"#;

/// Upsert price bars, returning how many rows were inserted or actually
/// changed. Re-upserting identical data reports zero.
pub(crate) fn upsert_price_bars(
    connection: &Connection,
    bars: &[PriceBar],
) -> Result<usize, WarehouseError> {
    let mut statement = connection.prepare(STOCKS_UPSERT)?;
    let mut changed = 0usize;
    for bar in bars {
        changed += statement.execute(params![
            bar.ticker.as_str(),
            bar.date_string(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            i64::try_from(bar.volume).unwrap_or(i64::MAX),
        ])?;
    }
    Ok(changed)
}

/// Upsert news items keyed by URL, returning how many rows were inserted or
/// actually changed.
pub(crate) fn upsert_news_items(
    connection: &Connection,
    items: &[NewsItem],
) -> Result<usize, WarehouseError> {
    let mut statement = connection.prepare(NEWS_UPSERT)?;
    let mut changed = 0usize;
    for item in items {
        changed += statement.execute(params![
            item.headline,
            item.published_at.format_iso_no_tz(),
            item.source,
            item.url,
        ])?;
    }
    Ok(changed)
}
