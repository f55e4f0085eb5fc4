use super::news::classify_transport;
use super::FetchError;
use crate::raw::RawPriceTable;
use crate::Ticker;

/// Abstraction over the daily price provider.
pub trait PriceFeed {
    /// Fetch the last `days` calendar days of daily bars for one ticker as a
    /// raw tabular payload.
    fn daily_window(&self, ticker: &Ticker, days: u32) -> Result<RawPriceTable, FetchError>;
}

/// Blocking HTTP client for a price gateway speaking the tabular JSON
/// contract (`{"columns": [...], "rows": [...]}`).
pub struct HttpPriceFeed {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpPriceFeed {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl PriceFeed for HttpPriceFeed {
    fn daily_window(&self, ticker: &Ticker, days: u32) -> Result<RawPriceTable, FetchError> {
        let url = format!(
            "{}/daily?ticker={}&days={}",
            self.base_url,
            urlencoding::encode(ticker.as_str()),
            days,
        );
        let response = self.client.get(&url).send().map_err(classify_transport)?;

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
        if !status.is_success() {
            return Err(FetchError::Api {
                code: status.as_u16().to_string(),
                message: format!("price gateway rejected request for {ticker}"),
            });
        }

        response
            .json::<RawPriceTable>()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
