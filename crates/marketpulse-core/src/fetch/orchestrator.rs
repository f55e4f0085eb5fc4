use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::news::{NewsFeed, PAGE_SIZE};
use super::prices::PriceFeed;
use super::retry::RetryOnce;
use super::FetchError;
use crate::normalize::{normalize_price_table, NewsBatch, PriceTableError};
use crate::raw::RawArticle;
use crate::{EventTime, PriceBar, Ticker};

const CATEGORIES: &[&str] = &["business", "technology", "general"];

const MARKET_QUERIES: &[&str] = &[
    "economy OR inflation",
    "markets OR stocks OR equities",
    "interest rates OR central bank OR fed OR ECB",
    "earnings OR quarterly results",
    "technology OR AI OR artificial intelligence",
    "energy OR oil OR gas OR renewables",
];

/// Knobs of one news collection run.
#[derive(Debug, Clone)]
pub struct FetchProfile {
    pub countries: Vec<String>,
    pub categories: Vec<String>,
    pub queries: Vec<String>,
    pub page_cap: u32,
    pub window_hours: i64,
    pub page_size: usize,
    pub page_pause: Duration,
    pub retry: RetryOnce,
}

impl FetchProfile {
    /// Frequent shallow sweep: one market, one page per unit, last 24h.
    pub fn daily() -> Self {
        Self {
            countries: vec!["us".to_owned()],
            page_cap: 1,
            window_hours: 24,
            ..Self::base()
        }
    }

    /// Deeper sweep across markets for catching up after a gap.
    pub fn backfill() -> Self {
        Self {
            countries: vec!["us".to_owned(), "gb".to_owned(), "tr".to_owned()],
            page_cap: 3,
            window_hours: 48,
            ..Self::base()
        }
    }

    fn base() -> Self {
        Self {
            countries: Vec::new(),
            categories: CATEGORIES.iter().map(|s| (*s).to_owned()).collect(),
            queries: MARKET_QUERIES.iter().map(|s| (*s).to_owned()).collect(),
            page_cap: 1,
            window_hours: 24,
            page_size: PAGE_SIZE,
            page_pause: Duration::from_millis(100),
            retry: RetryOnce::default(),
        }
    }
}

/// Result of one news run. `rate_limited` means the run stopped early and
/// whatever was collected up to that point is all there is.
#[derive(Debug)]
pub struct NewsRun {
    pub batch: NewsBatch,
    pub rate_limited: bool,
    pub units_attempted: usize,
    pub units_empty: usize,
}

enum UnitOutcome {
    Articles(Vec<RawArticle>),
    Empty,
    RateLimited,
}

/// Drives a news collection run: every (country, category) headline unit,
/// then every topic query, each unit isolated so one bad unit cannot sink
/// the rest. A rate-limit signal aborts everything that remains.
pub struct NewsFetcher<'a, F: NewsFeed> {
    feed: &'a F,
    profile: FetchProfile,
}

impl<'a, F: NewsFeed> NewsFetcher<'a, F> {
    pub fn new(feed: &'a F, profile: FetchProfile) -> Self {
        Self { feed, profile }
    }

    pub fn run(&self) -> NewsRun {
        let to = EventTime::now();
        let from = EventTime::from_offset_datetime(
            to.into_inner() - time::Duration::hours(self.profile.window_hours),
        );

        let mut run = NewsRun {
            batch: NewsBatch::new(),
            rate_limited: false,
            units_attempted: 0,
            units_empty: 0,
        };

        'units: for country in &self.profile.countries {
            for category in &self.profile.categories {
                let outcome = self.paginate(|page| {
                    self.feed
                        .top_headlines(country, category, page, self.profile.page_size)
                });
                if self.absorb(&mut run, outcome, &format!("{country}/{category}")) {
                    break 'units;
                }
            }
        }

        if !run.rate_limited {
            for query in &self.profile.queries {
                let outcome = self.paginate(|page| {
                    self.feed
                        .everything(query, &from, &to, page, self.profile.page_size)
                });
                if self.absorb(&mut run, outcome, query) {
                    break;
                }
            }
        }

        info!(
            articles = run.batch.len(),
            units = run.units_attempted,
            empty = run.units_empty,
            rate_limited = run.rate_limited,
            "news run finished"
        );
        run
    }

    /// Fold a unit outcome into the run. Returns true when the run must abort.
    fn absorb(&self, run: &mut NewsRun, outcome: UnitOutcome, unit: &str) -> bool {
        run.units_attempted += 1;
        match outcome {
            UnitOutcome::Articles(articles) => {
                run.batch.extend_from_raw(articles.iter());
                false
            }
            UnitOutcome::Empty => {
                run.units_empty += 1;
                false
            }
            UnitOutcome::RateLimited => {
                warn!(unit, "rate limited, aborting run");
                run.rate_limited = true;
                true
            }
        }
    }

    /// Walk pages 1..=page_cap of one unit. Any post-retry failure empties
    /// the whole unit, including pages already collected.
    fn paginate(
        &self,
        mut fetch: impl FnMut(u32) -> Result<super::ArticlePage, FetchError>,
    ) -> UnitOutcome {
        let mut collected = Vec::new();
        for page in 1..=self.profile.page_cap {
            let result = self.profile.retry.run(|| fetch(page));
            let envelope = match result {
                Ok(envelope) => envelope,
                Err(FetchError::RateLimited(_)) => return UnitOutcome::RateLimited,
                Err(err) => {
                    warn!(error = %err, page, "unit failed after retry, dropping unit");
                    return UnitOutcome::Empty;
                }
            };

            if !envelope.is_ok() {
                if envelope.is_rate_limited() {
                    return UnitOutcome::RateLimited;
                }
                warn!(
                    code = envelope.code.as_deref().unwrap_or("unknown"),
                    message = envelope.message.as_deref().unwrap_or(""),
                    "provider rejected unit, dropping it"
                );
                return UnitOutcome::Empty;
            }

            let count = envelope.articles.len();
            collected.extend(envelope.articles);
            if count == 0 || count < self.profile.page_size || page == self.profile.page_cap {
                break;
            }
            thread::sleep(self.profile.page_pause);
        }

        if collected.is_empty() {
            UnitOutcome::Empty
        } else {
            UnitOutcome::Articles(collected)
        }
    }
}

/// Result of one price run across a ticker universe.
#[derive(Debug)]
pub struct PriceRun {
    pub bars: Vec<PriceBar>,
    pub tickers_failed: Vec<Ticker>,
    pub rate_limited: bool,
}

/// Fetches and normalizes daily bars ticker by ticker. A failing ticker is
/// recorded and skipped; a rate-limit signal stops the remaining universe.
pub struct PriceFetcher<'a, F: PriceFeed> {
    feed: &'a F,
    retry: RetryOnce,
    days: u32,
}

impl<'a, F: PriceFeed> PriceFetcher<'a, F> {
    pub fn new(feed: &'a F, retry: RetryOnce, days: u32) -> Self {
        Self { feed, retry, days }
    }

    pub fn run(&self, tickers: &[Ticker]) -> PriceRun {
        let mut run = PriceRun {
            bars: Vec::new(),
            tickers_failed: Vec::new(),
            rate_limited: false,
        };

        for ticker in tickers {
            let table = match self.retry.run(|| self.feed.daily_window(ticker, self.days)) {
                Ok(table) => table,
                Err(FetchError::RateLimited(message)) => {
                    warn!(%ticker, message, "rate limited, stopping price run");
                    run.rate_limited = true;
                    break;
                }
                Err(err) => {
                    warn!(%ticker, error = %err, "price fetch failed, skipping ticker");
                    run.tickers_failed.push(ticker.clone());
                    continue;
                }
            };

            match normalize_price_table(ticker, &table) {
                Ok(bars) => {
                    info!(%ticker, rows = bars.len(), "normalized price bars");
                    run.bars.extend(bars);
                }
                Err(PriceTableError::NoUsableData) => {
                    warn!(%ticker, "price table has no usable data, skipping ticker");
                }
            }
        }

        run
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::fetch::ArticlePage;
    use crate::raw::RawPriceTable;

    fn article(url: &str) -> RawArticle {
        RawArticle {
            title: Some(format!("headline for {url}")),
            description: None,
            published_at: Some("2025-08-21T08:00:00Z".to_owned()),
            source: None,
            url: Some(url.to_owned()),
        }
    }

    fn ok_page(urls: &[&str]) -> ArticlePage {
        ArticlePage {
            status: "ok".to_owned(),
            articles: urls.iter().map(|u| article(u)).collect(),
            total_results: urls.len() as u64,
            ..ArticlePage::default()
        }
    }

    /// Scripted feed: pops one canned response per call and records calls.
    struct ScriptedFeed {
        responses: RefCell<Vec<Result<ArticlePage, FetchError>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedFeed {
        fn new(responses: Vec<Result<ArticlePage, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn next(&self, label: String) -> Result<ArticlePage, FetchError> {
            self.calls.borrow_mut().push(label);
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                Ok(ok_page(&[]))
            } else {
                responses.remove(0)
            }
        }
    }

    impl NewsFeed for ScriptedFeed {
        fn top_headlines(
            &self,
            country: &str,
            category: &str,
            page: u32,
            _page_size: usize,
        ) -> Result<ArticlePage, FetchError> {
            self.next(format!("headlines:{country}/{category}/p{page}"))
        }

        fn everything(
            &self,
            query: &str,
            _from: &EventTime,
            _to: &EventTime,
            page: u32,
            _page_size: usize,
        ) -> Result<ArticlePage, FetchError> {
            self.next(format!("everything:{query}/p{page}"))
        }
    }

    fn quick_profile(countries: &[&str], page_cap: u32) -> FetchProfile {
        FetchProfile {
            countries: countries.iter().map(|s| (*s).to_owned()).collect(),
            categories: vec!["business".to_owned()],
            queries: Vec::new(),
            page_cap,
            window_hours: 24,
            page_size: 2,
            page_pause: Duration::ZERO,
            retry: RetryOnce::new(Duration::ZERO),
        }
    }

    #[test]
    fn failed_unit_does_not_block_later_units() {
        let feed = ScriptedFeed::new(vec![
            Err(FetchError::Transport {
                message: "down".into(),
                retryable: true,
            }),
            Err(FetchError::Transport {
                message: "still down".into(),
                retryable: true,
            }),
            Ok(ok_page(&["https://n/1"])),
        ]);
        let run = NewsFetcher::new(&feed, quick_profile(&["gb", "us"], 1)).run();

        assert!(!run.rate_limited);
        assert_eq!(run.units_attempted, 2);
        assert_eq!(run.units_empty, 1);
        assert_eq!(run.batch.len(), 1);
        // The gb unit burned both attempts before us ran at all.
        assert_eq!(
            *feed.calls.borrow(),
            vec![
                "headlines:gb/business/p1",
                "headlines:gb/business/p1",
                "headlines:us/business/p1",
            ]
        );
    }

    #[test]
    fn rate_limit_aborts_remaining_units() {
        let feed = ScriptedFeed::new(vec![Ok(ArticlePage {
            status: "error".to_owned(),
            code: Some("rateLimited".to_owned()),
            ..ArticlePage::default()
        })]);
        let run = NewsFetcher::new(&feed, quick_profile(&["us", "gb", "tr"], 1)).run();

        assert!(run.rate_limited);
        assert_eq!(run.units_attempted, 1);
        assert_eq!(feed.calls.borrow().len(), 1);
    }

    #[test]
    fn pagination_stops_on_short_page_and_dedups_across_units() {
        let feed = ScriptedFeed::new(vec![
            // First unit: full page then short page.
            Ok(ok_page(&["https://n/1", "https://n/2"])),
            Ok(ok_page(&["https://n/3"])),
            // Second unit repeats a URL already seen.
            Ok(ok_page(&["https://n/2"])),
        ]);
        let mut profile = quick_profile(&["us"], 3);
        profile.categories = vec!["business".to_owned(), "technology".to_owned()];
        let run = NewsFetcher::new(&feed, profile).run();

        assert_eq!(run.batch.len(), 3);
        assert_eq!(
            *feed.calls.borrow(),
            vec![
                "headlines:us/business/p1",
                "headlines:us/business/p2",
                "headlines:us/technology/p1",
            ]
        );
    }

    #[test]
    fn failed_unit_discards_pages_already_collected() {
        let feed = ScriptedFeed::new(vec![
            Ok(ok_page(&["https://n/1", "https://n/2"])),
            Err(FetchError::Transport {
                message: "flaky".into(),
                retryable: false,
            }),
        ]);
        let run = NewsFetcher::new(&feed, quick_profile(&["us"], 3)).run();

        assert_eq!(run.batch.len(), 0);
        assert_eq!(run.units_empty, 1);
    }

    struct ScriptedPriceFeed {
        responses: RefCell<Vec<Result<RawPriceTable, FetchError>>>,
    }

    impl PriceFeed for ScriptedPriceFeed {
        fn daily_window(&self, _ticker: &Ticker, _days: u32) -> Result<RawPriceTable, FetchError> {
            self.responses.borrow_mut().remove(0)
        }
    }

    fn price_table() -> RawPriceTable {
        serde_json::from_value(json!({
            "columns": ["Date", "Close"],
            "rows": [["2025-01-02", 11.0]],
        }))
        .expect("valid table json")
    }

    #[test]
    fn price_run_contains_per_ticker_failures() {
        let feed = ScriptedPriceFeed {
            responses: RefCell::new(vec![
                Err(FetchError::Decode("garbage body".into())),
                Ok(price_table()),
            ]),
        };
        let tickers = [
            Ticker::parse("MSFT").expect("valid"),
            Ticker::parse("AAPL").expect("valid"),
        ];
        let run = PriceFetcher::new(&feed, RetryOnce::new(Duration::ZERO), 7).run(&tickers);

        assert_eq!(run.bars.len(), 1);
        assert_eq!(run.tickers_failed, vec![tickers[0].clone()]);
        assert!(!run.rate_limited);
    }

    #[test]
    fn price_run_stops_on_rate_limit() {
        let feed = ScriptedPriceFeed {
            responses: RefCell::new(vec![Err(FetchError::RateLimited("quota".into()))]),
        };
        let tickers = [
            Ticker::parse("MSFT").expect("valid"),
            Ticker::parse("AAPL").expect("valid"),
        ];
        let run = PriceFetcher::new(&feed, RetryOnce::new(Duration::ZERO), 7).run(&tickers);

        assert!(run.rate_limited);
        assert!(run.bars.is_empty());
        assert!(run.tickers_failed.is_empty());
    }
}
