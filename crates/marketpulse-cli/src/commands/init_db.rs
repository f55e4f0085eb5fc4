use marketpulse_warehouse::Warehouse;
use serde_json::json;

use crate::config::Config;
use crate::error::CliError;

pub fn run(config: &Config) -> Result<(), CliError> {
    let warehouse = Warehouse::open(&config.warehouse)?;
    let summary = json!({
        "db_path": warehouse.db_path().display().to_string(),
        "stocks": warehouse.stocks_row_count()?,
        "news": warehouse.news_row_count()?,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
