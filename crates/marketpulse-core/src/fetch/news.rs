use serde::Deserialize;

use super::FetchError;
use crate::raw::RawArticle;
use crate::EventTime;

/// Upstream page size; a shorter page signals the last one.
pub const PAGE_SIZE: usize = 100;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// One page of the news provider's response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePage {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    #[serde(default, rename = "totalResults")]
    pub total_results: u64,
}

impl ArticlePage {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    pub fn is_rate_limited(&self) -> bool {
        self.code.as_deref() == Some("rateLimited")
    }
}

/// Abstraction over the headline provider, so orchestration and tests do not
/// depend on a live HTTP endpoint.
pub trait NewsFeed {
    fn top_headlines(
        &self,
        country: &str,
        category: &str,
        page: u32,
        page_size: usize,
    ) -> Result<ArticlePage, FetchError>;

    fn everything(
        &self,
        query: &str,
        from: &EventTime,
        to: &EventTime,
        page: u32,
        page_size: usize,
    ) -> Result<ArticlePage, FetchError>;
}

/// Blocking HTTP client for the news provider.
pub struct HttpNewsFeed {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl HttpNewsFeed {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_owned())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn get_page(&self, url: &str) -> Result<ArticlePage, FetchError> {
        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .map_err(classify_transport)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited(format!("http status {status}")));
        }
        if status.is_server_error() {
            return Err(FetchError::Transport {
                message: format!("http status {status}"),
                retryable: true,
            });
        }

        // Client errors still carry a JSON envelope with status/code, which
        // the caller inspects; only an undecodable body is fatal here.
        response
            .json::<ArticlePage>()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl NewsFeed for HttpNewsFeed {
    fn top_headlines(
        &self,
        country: &str,
        category: &str,
        page: u32,
        page_size: usize,
    ) -> Result<ArticlePage, FetchError> {
        let url = format!(
            "{}/top-headlines?country={}&category={}&page={}&pageSize={}",
            self.base_url,
            urlencoding::encode(country),
            urlencoding::encode(category),
            page,
            page_size,
        );
        self.get_page(&url)
    }

    fn everything(
        &self,
        query: &str,
        from: &EventTime,
        to: &EventTime,
        page: u32,
        page_size: usize,
    ) -> Result<ArticlePage, FetchError> {
        let url = format!(
            "{}/everything?q={}&from={}&to={}&language=en&sortBy=publishedAt&page={}&pageSize={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&from.format_iso_no_tz()),
            urlencoding::encode(&to.format_iso_no_tz()),
            page,
            page_size,
        );
        self.get_page(&url)
    }
}

pub(super) fn classify_transport(err: reqwest::Error) -> FetchError {
    let retryable = err.is_timeout() || err.is_connect();
    let message = if err.is_timeout() {
        format!("request timeout: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    };
    FetchError::Transport { message, retryable }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_provider_envelope() {
        let page: ArticlePage = serde_json::from_str(
            r#"{"status":"ok","totalResults":2,"articles":[{"title":"a","url":"https://n/1"},{"title":"b","url":"https://n/2"}]}"#,
        )
        .expect("must decode");
        assert!(page.is_ok());
        assert!(!page.is_rate_limited());
        assert_eq!(page.articles.len(), 2);
        assert_eq!(page.total_results, 2);
    }

    #[test]
    fn recognizes_rate_limit_envelope() {
        let page: ArticlePage = serde_json::from_str(
            r#"{"status":"error","code":"rateLimited","message":"too many"}"#,
        )
        .expect("must decode");
        assert!(!page.is_ok());
        assert!(page.is_rate_limited());
    }
}
