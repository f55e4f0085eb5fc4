use std::collections::HashSet;

use crate::raw::RawArticle;
use crate::{EventTime, NewsItem};

/// Normalize one raw article into a canonical item, or reject it.
///
/// An article needs a non-empty title, a non-empty URL and a parseable
/// publication timestamp; anything less is dropped silently.
pub fn normalize_article(raw: &RawArticle) -> Option<NewsItem> {
    let headline = raw.title.as_deref().map(str::trim).unwrap_or("");
    let url = raw.url.as_deref().map(str::trim).unwrap_or("");
    if headline.is_empty() || url.is_empty() {
        return None;
    }

    let published_at = raw
        .published_at
        .as_deref()
        .and_then(|value| EventTime::parse_flexible(value).ok())?;

    let source = raw
        .source
        .as_ref()
        .and_then(|s| s.name.as_deref())
        .map(str::trim)
        .unwrap_or("")
        .to_owned();

    NewsItem::new(headline.to_owned(), published_at, source, url.to_owned()).ok()
}

/// Accumulates normalized articles across fetch units, deduplicating by URL
/// with first-wins semantics.
#[derive(Debug, Default)]
pub struct NewsBatch {
    items: Vec<NewsItem>,
    seen_urls: HashSet<String>,
}

impl NewsBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item unless its URL was already seen. Returns whether it was kept.
    pub fn push(&mut self, item: NewsItem) -> bool {
        if self.seen_urls.contains(&item.url) {
            return false;
        }
        self.seen_urls.insert(item.url.clone());
        self.items.push(item);
        true
    }

    pub fn extend_from_raw<'a>(&mut self, raw: impl IntoIterator<Item = &'a RawArticle>) {
        for article in raw {
            if let Some(item) = normalize_article(article) {
                self.push(item);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<NewsItem> {
        self.items
    }
}
