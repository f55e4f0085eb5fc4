use serde::Serialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;

use crate::{EventTime, Ticker, ValidationError};

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// One canonical daily price bar for a ticker.
///
/// `close` is always present; open/high/low may be absent when the upstream
/// table omitted them. All present values are finite and non-negative, and
/// `low <= high` holds whenever both are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub ticker: Ticker,
    #[serde(serialize_with = "serialize_date")]
    pub date: Date,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Build a validated bar. Non-finite or negative inputs are rejected;
    /// an inverted low/high pair is swapped rather than rejected, since the
    /// values themselves are plausible and only mislabeled.
    pub fn new(
        ticker: Ticker,
        date: Date,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        check_field("close", Some(close))?;
        check_field("open", open)?;
        check_field("high", high)?;
        check_field("low", low)?;

        let (low, high) = match (low, high) {
            (Some(l), Some(h)) if l > h => (Some(h), Some(l)),
            pair => pair,
        };

        Ok(Self {
            ticker,
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn date_string(&self) -> String {
        self.date
            .format(ISO_DATE)
            .expect("calendar dates are always formattable")
    }
}

fn check_field(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    if let Some(v) = value {
        if !v.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if v < 0.0 {
            return Err(ValidationError::NegativeValue { field });
        }
    }
    Ok(())
}

fn serialize_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rendered = date
        .format(ISO_DATE)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&rendered)
}

/// One canonical news article, keyed by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub headline: String,
    pub published_at: EventTime,
    /// Publisher name, empty when the feed omitted it.
    pub source: String,
    pub url: String,
}

impl NewsItem {
    pub fn new(
        headline: String,
        published_at: EventTime,
        source: String,
        url: String,
    ) -> Result<Self, ValidationError> {
        if headline.trim().is_empty() {
            return Err(ValidationError::EmptyHeadline);
        }
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        Ok(Self {
            headline,
            published_at,
            source,
            url,
        })
    }
}
