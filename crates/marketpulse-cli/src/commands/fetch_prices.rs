use marketpulse_core::{HttpPriceFeed, PriceFetcher, RetryOnce, Ticker};
use marketpulse_warehouse::Warehouse;
use serde_json::json;

use crate::config::Config;
use crate::error::CliError;

pub fn run(config: &Config, tickers: &[String], days: u32) -> Result<(), CliError> {
    let base_url = config.price_feed_url.clone().ok_or_else(|| {
        CliError::Config("MARKETPULSE_PRICE_FEED_URL must point at the price gateway".to_owned())
    })?;

    let tickers = tickers
        .iter()
        .map(|raw| Ticker::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let feed = HttpPriceFeed::new(base_url);
    let run = PriceFetcher::new(&feed, RetryOnce::default(), days).run(&tickers);

    let warehouse = Warehouse::open(&config.warehouse)?;
    let changed = warehouse.upsert_price_bars(&run.bars)?;

    let summary = json!({
        "tickers": tickers.len(),
        "bars": run.bars.len(),
        "changed": changed,
        "failed": run.tickers_failed.iter().map(Ticker::as_str).collect::<Vec<_>>(),
        "rate_limited": run.rate_limited,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
