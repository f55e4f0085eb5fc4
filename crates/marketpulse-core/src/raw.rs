//! Raw upstream payload shapes, deserialized as-is before normalization.

use serde::Deserialize;

/// Column label of a tabular price payload. Upstream tables either carry a
/// flat header (`"Close"`) or a multi-level one (`["Close", "AAPL"]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawColumn {
    Simple(String),
    Composite(Vec<String>),
}

impl RawColumn {
    /// Flatten a multi-level label into a single string, joining non-empty
    /// levels with `_` (`["Close", "AAPL"]` -> `"Close_AAPL"`).
    pub fn flatten(&self) -> String {
        match self {
            Self::Simple(label) => label.clone(),
            Self::Composite(levels) => levels
                .iter()
                .map(|level| level.trim())
                .filter(|level| !level.is_empty())
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// Tabular price payload: a header row plus value rows of equal width.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPriceTable {
    pub columns: Vec<RawColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl RawPriceTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Publisher block of a raw news article.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub name: Option<String>,
}

/// One raw news article exactly as the feed returned it. Every field is
/// optional; normalization decides what is usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_composite_columns_skipping_empty_levels() {
        let col = RawColumn::Composite(vec!["Close".into(), "AAPL".into()]);
        assert_eq!(col.flatten(), "Close_AAPL");

        let col = RawColumn::Composite(vec!["Date".into(), "".into()]);
        assert_eq!(col.flatten(), "Date");
    }

    #[test]
    fn deserializes_mixed_header() {
        let table: RawPriceTable = serde_json::from_str(
            r#"{"columns": ["Date", ["Close", "AAPL"]], "rows": [["2025-01-02", 11.0]]}"#,
        )
        .expect("must deserialize");
        assert_eq!(table.columns[0].flatten(), "Date");
        assert_eq!(table.columns[1].flatten(), "Close_AAPL");
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn article_tolerates_missing_fields() {
        let article: RawArticle = serde_json::from_str(r#"{"title": "hi"}"#).expect("must parse");
        assert_eq!(article.title.as_deref(), Some("hi"));
        assert!(article.url.is_none());
        assert!(article.source.is_none());
    }
}
