use marketpulse_core::{FetchProfile, HttpNewsFeed, NewsFetcher};
use marketpulse_warehouse::Warehouse;
use serde_json::json;

use crate::cli::FetchMode;
use crate::config::Config;
use crate::error::CliError;

pub fn run(config: &Config, mode: FetchMode) -> Result<(), CliError> {
    let api_key = config
        .news_api_key
        .clone()
        .ok_or_else(|| CliError::Config("NEWS_API_KEY must be set".to_owned()))?;

    let profile = match mode {
        FetchMode::Daily => FetchProfile::daily(),
        FetchMode::Backfill => FetchProfile::backfill(),
    };

    let feed = HttpNewsFeed::new(api_key);
    let run = NewsFetcher::new(&feed, profile).run();

    let warehouse = Warehouse::open(&config.warehouse)?;
    let changed = warehouse.upsert_news_items(run.batch.items())?;

    let summary = json!({
        "articles": run.batch.len(),
        "changed": changed,
        "units_attempted": run.units_attempted,
        "units_empty": run.units_empty,
        "rate_limited": run.rate_limited,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
