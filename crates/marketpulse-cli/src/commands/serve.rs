use marketpulse_warehouse::Warehouse;
use tracing::info;

use crate::config::Config;
use crate::error::CliError;

pub fn run(config: &Config, port: Option<u16>) -> Result<(), CliError> {
    let warehouse = Warehouse::open(&config.warehouse)?;
    let port = port.unwrap_or(config.port);
    info!(db_path = %warehouse.db_path().display(), port, "starting api server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(marketpulse_api::serve(warehouse, port))?;
    Ok(())
}
