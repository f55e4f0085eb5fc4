//! Relational store for price bars and news, backed by `DuckDB`.
//!
//! Writes go through conflict-aware upserts that report how many rows truly
//! changed; reads are thin, bounded queries used by the HTTP API and CLI.

pub mod duckdb;
pub mod migrations;
mod queries;
mod upsert;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use thiserror::Error;
use tracing::info;

use marketpulse_core::{NewsItem, PriceBar};

pub use duckdb::{AccessMode, DuckDbConnectionManager, PooledConnection};
pub use queries::{ClosingPrice, NewsRow};

const ENV_DB_PATH: &str = "MARKETPULSE_DB";
const DEFAULT_DB_PATH: &str = "data/marketpulse.duckdb";
const MAX_POOL_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("warehouse internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub db_path: PathBuf,
}

impl WarehouseConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Resolve the database location from `MARKETPULSE_DB`, falling back to
    /// the default relative path.
    pub fn from_env() -> Self {
        let db_path = env::var(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));
        Self { db_path }
    }
}

/// Handle to the store. Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open (creating parent directories if needed) and migrate the database.
    pub fn open(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let warehouse = Self {
            manager: DuckDbConnectionManager::new(config.db_path.as_path(), MAX_POOL_SIZE),
        };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations. Safe to call repeatedly.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        info!(db_path = %self.db_path().display(), "warehouse initialized");
        Ok(())
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Upsert a batch of price bars in one transaction. Returns the number of
    /// rows inserted or materially changed; a batch identical to what is
    /// stored reports zero. Any failure rolls the whole batch back.
    pub fn upsert_price_bars(&self, bars: &[PriceBar]) -> Result<usize, WarehouseError> {
        if bars.is_empty() {
            return Ok(0);
        }
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = upsert::upsert_price_bars(&connection, bars);
        let changed = finalize_transaction(&connection, result)?;
        info!(rows = bars.len(), changed, "price bars upserted");
        Ok(changed)
    }

    /// Upsert a batch of news items keyed by URL, same contract as
    /// [`Self::upsert_price_bars`].
    pub fn upsert_news_items(&self, items: &[NewsItem]) -> Result<usize, WarehouseError> {
        if items.is_empty() {
            return Ok(0);
        }
        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = upsert::upsert_news_items(&connection, items);
        let changed = finalize_transaction(&connection, result)?;
        info!(rows = items.len(), changed, "news items upserted");
        Ok(changed)
    }

    pub fn ticker_exists(&self, ticker: &str) -> Result<bool, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::ticker_exists(&connection, ticker)
    }

    pub fn closes_by_days(
        &self,
        ticker: &str,
        days: u32,
    ) -> Result<Vec<ClosingPrice>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::closes_by_days(&connection, ticker, days)
    }

    pub fn closes_last_n(&self, ticker: &str, n: u32) -> Result<Vec<ClosingPrice>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::closes_last_n(&connection, ticker, n)
    }

    pub fn news_by_days(
        &self,
        days: u32,
        query: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<NewsRow>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::news_by_days(&connection, days, query, limit, offset)
    }

    pub fn news_last_n(&self, limit: u32, offset: u32) -> Result<Vec<NewsRow>, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::news_last_n(&connection, limit, offset)
    }

    pub fn stocks_row_count(&self) -> Result<i64, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::stocks_row_count(&connection)
    }

    pub fn news_row_count(&self) -> Result<i64, WarehouseError> {
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        queries::news_row_count(&connection)
    }
}

fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}
