use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::ValidationError;

const ISO_NO_TZ: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const ISO_NO_TZ_SPACED: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Publication timestamp guaranteed to be UTC at whole-second precision.
///
/// Upstream feeds disagree on timestamp shape (trailing `Z`, explicit offset,
/// naive datetime, or bare date). Everything is folded into one canonical form
/// rendered as `YYYY-MM-DDTHH:MM:SS` with no timezone suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime(OffsetDateTime);

impl EventTime {
    pub fn now() -> Self {
        Self::from_offset_datetime(OffsetDateTime::now_utc())
    }

    /// Parse an upstream timestamp string, trying formats from strictest to
    /// loosest: RFC3339 (covers `Z` and offsets), naive ISO datetime with a
    /// `T` or space separator (assumed UTC), then bare date (midnight UTC).
    pub fn parse_flexible(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Ok(Self::from_offset_datetime(parsed));
        }

        for format in [ISO_NO_TZ, ISO_NO_TZ_SPACED] {
            if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, format) {
                return Ok(Self::from_offset_datetime(parsed.assume_utc()));
            }
        }

        if let Some(prefix) = trimmed.get(..10) {
            if let Ok(date) = Date::parse(prefix, ISO_DATE) {
                let midnight = PrimitiveDateTime::new(date, Time::MIDNIGHT);
                return Ok(Self::from_offset_datetime(midnight.assume_utc()));
            }
        }

        Err(ValidationError::UnparseableTimestamp {
            value: input.to_owned(),
        })
    }

    /// Normalize an arbitrary offset datetime to UTC whole seconds.
    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(UtcOffset::UTC);
        let truncated = utc
            .replace_nanosecond(0)
            .expect("zero nanoseconds is always in range");
        Self(truncated)
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn date(self) -> Date {
        self.0.date()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SS`, the storage form.
    pub fn format_iso_no_tz(self) -> String {
        self.0
            .format(ISO_NO_TZ)
            .expect("EventTime must be formattable")
    }
}

impl Display for EventTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso_no_tz())
    }
}

impl Serialize for EventTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso_no_tz())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse_flexible(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_suffix_and_strips_it() {
        let parsed = EventTime::parse_flexible("2025-08-21T12:34:56Z").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T12:34:56");
    }

    #[test]
    fn converts_explicit_offset_to_utc() {
        let parsed = EventTime::parse_flexible("2025-08-21T14:34:56+02:00").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T12:34:56");
    }

    #[test]
    fn naive_datetime_is_assumed_utc() {
        let parsed = EventTime::parse_flexible("2025-08-21T12:34:56").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T12:34:56");
    }

    #[test]
    fn space_separated_datetime_keeps_the_time_of_day() {
        let parsed = EventTime::parse_flexible("2025-08-21 12:34:56").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T12:34:56");
    }

    #[test]
    fn bare_date_falls_back_to_midnight_utc() {
        let parsed = EventTime::parse_flexible("2025-08-21").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T00:00:00");
    }

    #[test]
    fn drops_subsecond_precision() {
        let parsed = EventTime::parse_flexible("2025-08-21T12:34:56.789Z").expect("must parse");
        assert_eq!(parsed.format_iso_no_tz(), "2025-08-21T12:34:56");
    }

    #[test]
    fn rejects_garbage() {
        let err = EventTime::parse_flexible("yesterday-ish").expect_err("must fail");
        assert!(matches!(err, ValidationError::UnparseableTimestamp { .. }));
    }
}
