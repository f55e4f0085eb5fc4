use ::duckdb::{params, Connection};
use serde::Serialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::WarehouseError;

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// One closing price as served by the read API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosingPrice {
    pub date: String,
    pub close: f64,
}

/// One news row as served by the read API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsRow {
    pub published_at: String,
    pub source: String,
    pub headline: String,
    pub url: String,
}

pub(crate) fn ticker_exists(
    connection: &Connection,
    ticker: &str,
) -> Result<bool, WarehouseError> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM stocks WHERE ticker = ?",
        params![ticker],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Closing prices within the last `days` calendar days, oldest first.
pub(crate) fn closes_by_days(
    connection: &Connection,
    ticker: &str,
    days: u32,
) -> Result<Vec<ClosingPrice>, WarehouseError> {
    let cutoff = cutoff_date(days)?;
    let mut statement = connection.prepare(
        "SELECT CAST(date AS VARCHAR), close FROM stocks \
         WHERE ticker = ? AND date >= CAST(? AS DATE) \
         ORDER BY date ASC",
    )?;
    let rows = statement
        .query_map(params![ticker, cutoff], |row| {
            Ok(ClosingPrice {
                date: row.get(0)?,
                close: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The latest `n` closing prices, returned oldest first.
pub(crate) fn closes_last_n(
    connection: &Connection,
    ticker: &str,
    n: u32,
) -> Result<Vec<ClosingPrice>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT CAST(date AS VARCHAR), close FROM stocks \
         WHERE ticker = ? \
         ORDER BY date DESC LIMIT ?",
    )?;
    let mut rows = statement
        .query_map(params![ticker, i64::from(n)], |row| {
            Ok(ClosingPrice {
                date: row.get(0)?,
                close: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    rows.reverse();
    Ok(rows)
}

/// News within the last `days` days, newest first, optionally filtered by a
/// case-insensitive substring match on headline or source.
pub(crate) fn news_by_days(
    connection: &Connection,
    days: u32,
    query: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<NewsRow>, WarehouseError> {
    // published_at is stored as ISO text, so lexical comparison is
    // chronological and the day boundary is midnight UTC.
    let cutoff = format!("{}T00:00:00", cutoff_date(days)?);
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let pattern = format!("%{q}%");
            let mut statement = connection.prepare(
                "SELECT published_at, COALESCE(source, ''), headline, url FROM news \
                 WHERE published_at >= ? AND (headline ILIKE ? OR source ILIKE ?) \
                 ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
            )?;
            let rows = statement
                .query_map(
                    params![cutoff, pattern, pattern, i64::from(limit), i64::from(offset)],
                    news_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
        None => {
            let mut statement = connection.prepare(
                "SELECT published_at, COALESCE(source, ''), headline, url FROM news \
                 WHERE published_at >= ? \
                 ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
            )?;
            let rows = statement
                .query_map(
                    params![cutoff, i64::from(limit), i64::from(offset)],
                    news_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        }
    }
}

/// The latest news rows regardless of age, newest first.
pub(crate) fn news_last_n(
    connection: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<NewsRow>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT published_at, COALESCE(source, ''), headline, url FROM news \
         ORDER BY published_at DESC, id DESC LIMIT ? OFFSET ?",
    )?;
    let rows = statement
        .query_map(params![i64::from(limit), i64::from(offset)], news_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub(crate) fn stocks_row_count(connection: &Connection) -> Result<i64, WarehouseError> {
    let count = connection.query_row("SELECT COUNT(*) FROM stocks", [], |row| row.get(0))?;
    Ok(count)
}

pub(crate) fn news_row_count(connection: &Connection) -> Result<i64, WarehouseError> {
    let count = connection.query_row("SELECT COUNT(*) FROM news", [], |row| row.get(0))?;
    Ok(count)
}

fn news_row(row: &::duckdb::Row<'_>) -> Result<NewsRow, ::duckdb::Error> {
    Ok(NewsRow {
        published_at: row.get(0)?,
        source: row.get(1)?,
        headline: row.get(2)?,
        url: row.get(3)?,
    })
}

fn cutoff_date(days: u32) -> Result<String, WarehouseError> {
    let cutoff = OffsetDateTime::now_utc().date() - time::Duration::days(i64::from(days));
    cutoff
        .format(ISO_DATE)
        .map_err(|e| WarehouseError::Internal(e.to_string()))
}
