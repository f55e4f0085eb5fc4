use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "marketpulse", about = "Stock price and financial news ingestion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and apply pending schema migrations.
    InitDb,

    /// Fetch daily price bars for a ticker universe and upsert them.
    FetchPrices {
        /// Tickers to fetch, comma-separated or repeated.
        #[arg(long, required = true, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Calendar-day window to request from the price gateway.
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Run a news collection sweep and upsert the articles.
    FetchNews {
        #[arg(long, value_enum, default_value_t = FetchMode::Daily)]
        mode: FetchMode,
    },

    /// Serve the read-only HTTP API.
    Serve {
        /// Port to bind; falls back to MARKETPULSE_PORT, then 8000.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FetchMode {
    /// Shallow sweep of the last 24 hours, single market.
    Daily,
    /// Deeper multi-market sweep of the last 48 hours.
    Backfill,
}
