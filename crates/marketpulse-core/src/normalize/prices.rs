use serde_json::Value;
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::raw::RawPriceTable;
use crate::{PriceBar, Ticker};

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

const DATE_LABELS: &[&str] = &["date", "datetime"];
const CLOSE_LABELS: &[&str] = &["close"];
const ADJ_CLOSE_LABELS: &[&str] = &["adjclose", "adjustedclose"];
const OPEN_LABELS: &[&str] = &["open"];
const HIGH_LABELS: &[&str] = &["high"];
const LOW_LABELS: &[&str] = &["low"];
const VOLUME_LABELS: &[&str] = &["volume"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceTableError {
    /// The table has no resolvable date or close column, so nothing in it
    /// can be ingested. Callers treat this as a skip, not a hard failure.
    #[error("price table has no usable date/close columns")]
    NoUsableData,
}

/// Normalize a heterogeneous tabular price payload into canonical bars.
///
/// Header labels are matched case-insensitively ignoring punctuation, with a
/// ticker-suffixed column (`Close_AAPL`) preferred over a bare one when both
/// exist. Close falls back to adjusted close. Rows without a parseable date
/// or a close value are dropped; negative values are clipped to zero, and
/// absent open/high/low stay absent.
pub fn normalize_price_table(
    ticker: &Ticker,
    table: &RawPriceTable,
) -> Result<Vec<PriceBar>, PriceTableError> {
    let labels: Vec<String> = table
        .columns
        .iter()
        .map(|col| normalize_label(&col.flatten()))
        .collect();
    let suffix = normalize_label(ticker.as_str());

    let date_idx = resolve(&labels, DATE_LABELS, &suffix).ok_or(PriceTableError::NoUsableData)?;
    let close_idx = resolve(&labels, CLOSE_LABELS, &suffix)
        .or_else(|| resolve(&labels, ADJ_CLOSE_LABELS, &suffix))
        .ok_or(PriceTableError::NoUsableData)?;
    let open_idx = resolve(&labels, OPEN_LABELS, &suffix);
    let high_idx = resolve(&labels, HIGH_LABELS, &suffix);
    let low_idx = resolve(&labels, LOW_LABELS, &suffix);
    let volume_idx = resolve(&labels, VOLUME_LABELS, &suffix);

    let mut bars = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let Some(date) = row.get(date_idx).and_then(parse_date_cell) else {
            continue;
        };
        // A row with no close is unusable; a malformed close coerces to zero.
        let close = match row.get(close_idx) {
            None | Some(Value::Null) => continue,
            Some(cell) => numeric(cell).map(clip_zero).unwrap_or(0.0),
        };

        let open = optional_price(row, open_idx);
        let high = optional_price(row, high_idx);
        let low = optional_price(row, low_idx);
        let volume = volume_idx
            .and_then(|idx| row.get(idx))
            .and_then(numeric)
            .map(|v| clip_zero(v) as u64)
            .unwrap_or(0);

        if let Ok(bar) = PriceBar::new(ticker.clone(), date, open, high, low, close, volume) {
            bars.push(bar);
        }
    }

    Ok(bars)
}

/// Lowercase and strip everything that is not alphanumeric, so that
/// `"Adj Close"`, `"adj_close"` and `"AdjClose"` all compare equal.
fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Find the column whose normalized label starts with one of `wanted`,
/// preferring a column carrying the ticker as suffix.
fn resolve(labels: &[String], wanted: &[&str], suffix: &str) -> Option<usize> {
    for want in wanted {
        let candidates: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.starts_with(want))
            .map(|(idx, _)| idx)
            .collect();
        if candidates.is_empty() {
            continue;
        }
        if !suffix.is_empty() {
            if let Some(&idx) = candidates
                .iter()
                .find(|&&idx| labels[idx].ends_with(suffix))
            {
                return Some(idx);
            }
        }
        return Some(candidates[0]);
    }
    None
}

fn optional_price(row: &[Value], idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| row.get(i)).and_then(numeric).map(clip_zero)
}

fn clip_zero(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Coerce a JSON cell to a finite f64; numeric strings count.
fn numeric(cell: &Value) -> Option<f64> {
    let value = match cell {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Parse a date cell: ISO string (datetime prefixes allowed) or epoch seconds.
fn parse_date_cell(cell: &Value) -> Option<Date> {
    match cell {
        Value::String(s) => {
            let prefix = s.trim().get(..10)?;
            Date::parse(prefix, ISO_DATE).ok()
        }
        Value::Number(n) => {
            let seconds = n.as_i64()?;
            OffsetDateTime::from_unix_timestamp(seconds)
                .map(|dt| dt.date())
                .ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").expect("valid ticker")
    }

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> RawPriceTable {
        serde_json::from_value(json!({ "columns": columns, "rows": rows }))
            .expect("valid table json")
    }

    #[test]
    fn resolves_ticker_suffixed_columns_and_swaps_low_high() {
        let table = table(
            &["Date", "Open_AAPL", "High_AAPL", "Low_AAPL", "Close_AAPL", "Volume_AAPL"],
            vec![vec![
                json!("2025-01-02"),
                json!(10.0),
                json!(8.0),
                json!(12.0),
                json!(11.0),
                json!(100),
            ]],
        );

        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        assert_eq!(bars.len(), 1);
        let bar = &bars[0];
        assert_eq!(bar.date, date!(2025 - 01 - 02));
        assert_eq!(bar.low, Some(8.0));
        assert_eq!(bar.high, Some(12.0));
        assert_eq!(bar.close, 11.0);
        assert_eq!(bar.volume, 100);
    }

    #[test]
    fn prefers_suffixed_column_over_bare_one() {
        let table = table(
            &["Date", "Close", "Close_AAPL"],
            vec![vec![json!("2025-01-02"), json!(1.0), json!(2.0)]],
        );
        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        assert_eq!(bars[0].close, 2.0);
    }

    #[test]
    fn falls_back_to_adjusted_close() {
        let table = table(
            &["Date", "Adj Close"],
            vec![vec![json!("2025-01-02"), json!(3.5)]],
        );
        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        assert_eq!(bars[0].close, 3.5);
    }

    #[test]
    fn missing_close_column_is_no_usable_data() {
        let table = table(&["Date", "Open"], vec![vec![json!("2025-01-02"), json!(1.0)]]);
        assert_eq!(
            normalize_price_table(&ticker(), &table),
            Err(PriceTableError::NoUsableData)
        );
    }

    #[test]
    fn drops_rows_without_close_and_coerces_bad_close_to_zero() {
        let table = table(
            &["Date", "Close"],
            vec![
                vec![json!("2025-01-02"), json!(null)],
                vec![json!("2025-01-03"), json!("n/a")],
                vec![json!("2025-01-04"), json!(5.0)],
            ],
        );
        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 0.0);
        assert_eq!(bars[1].close, 5.0);
    }

    #[test]
    fn clips_negatives_and_preserves_absent_ohlc() {
        let table = table(
            &["Date", "Open", "Close", "Volume"],
            vec![vec![json!("2025-01-02"), json!(-4.0), json!(-1.0), json!(-50)]],
        );
        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        let bar = &bars[0];
        assert_eq!(bar.open, Some(0.0));
        assert_eq!(bar.high, None);
        assert_eq!(bar.close, 0.0);
        assert_eq!(bar.volume, 0);
    }

    #[test]
    fn accepts_datetime_strings_and_epoch_seconds() {
        let table = table(
            &["Date", "Close"],
            vec![
                vec![json!("2025-01-02 00:00:00"), json!(1.0)],
                vec![json!(1735776000), json!(2.0)],
                vec![json!("bogus"), json!(3.0)],
            ],
        );
        let bars = normalize_price_table(&ticker(), &table).expect("must normalize");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date!(2025 - 01 - 02));
        assert_eq!(bars[1].date, date!(2025 - 01 - 02));
    }
}
