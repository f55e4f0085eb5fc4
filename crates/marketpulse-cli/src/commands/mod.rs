mod fetch_news;
mod fetch_prices;
mod init_db;
mod serve;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::CliError;

pub fn run(cli: &Cli, config: &Config) -> Result<(), CliError> {
    match &cli.command {
        Command::InitDb => init_db::run(config),
        Command::FetchPrices { tickers, days } => fetch_prices::run(config, tickers, *days),
        Command::FetchNews { mode } => fetch_news::run(config, *mode),
        Command::Serve { port } => serve::run(config, *port),
    }
}
