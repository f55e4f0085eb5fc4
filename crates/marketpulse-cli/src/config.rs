use std::env;

use marketpulse_warehouse::WarehouseConfig;
use tracing_subscriber::EnvFilter;

const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
const ENV_PRICE_FEED_URL: &str = "MARKETPULSE_PRICE_FEED_URL";
const ENV_PORT: &str = "MARKETPULSE_PORT";
const ENV_LOG: &str = "MARKETPULSE_LOG";
const DEFAULT_PORT: u16 = 8000;

/// Everything the commands need from the environment, resolved once.
#[derive(Debug, Clone)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub news_api_key: Option<String>,
    pub price_feed_url: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var(ENV_PORT)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self {
            warehouse: WarehouseConfig::from_env(),
            news_api_key: non_empty(ENV_NEWS_API_KEY),
            price_feed_url: non_empty(ENV_PRICE_FEED_URL),
            port,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Install the global subscriber. `MARKETPULSE_LOG` takes an env-filter
/// directive, defaulting to `info`.
pub fn init_tracing() {
    let filter = env::var(ENV_LOG)
        .ok()
        .and_then(|raw| raw.parse::<EnvFilter>().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
