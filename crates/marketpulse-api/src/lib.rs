//! Thin read-only HTTP API over the warehouse.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info};

use marketpulse_core::Ticker;
use marketpulse_warehouse::Warehouse;

const DEFAULT_STOCK_DAYS: u32 = 7;
const MAX_STOCK_DAYS: u32 = 365;
const DEFAULT_LAST_N: u32 = 7;
const MAX_LAST_N: u32 = 252;
const DEFAULT_NEWS_DAYS: u32 = 7;
const MAX_NEWS_DAYS: u32 = 60;
const DEFAULT_NEWS_LIMIT: u32 = 20;
const MAX_NEWS_LIMIT: u32 = 100;

#[derive(Clone)]
pub struct AppState {
    pub warehouse: Warehouse,
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
            Self::Internal(detail) => {
                error!(detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<marketpulse_warehouse::WarehouseError> for ApiError {
    fn from(err: marketpulse_warehouse::WarehouseError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Clamp-free bound check: out-of-range values are rejected, not silently
/// clamped, so clients learn about their mistake.
fn bounded(value: Option<u32>, default: u32, max: u32, name: &str) -> Result<u32, ApiError> {
    let value = value.unwrap_or(default);
    if value < 1 || value > max {
        return Err(ApiError::BadRequest(format!(
            "{name} must be between 1 and {max}"
        )));
    }
    Ok(value)
}

fn parse_ticker(raw: &str) -> Result<Ticker, ApiError> {
    Ticker::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Run a blocking warehouse call off the async executor.
async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task panicked: {e}")))?
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize, Default)]
struct StockQuery {
    days: Option<u32>,
}

async fn stocks_by_days(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<StockQuery>,
) -> Result<Response, ApiError> {
    let ticker = parse_ticker(&ticker)?;
    let days = bounded(query.days, DEFAULT_STOCK_DAYS, MAX_STOCK_DAYS, "days")?;

    let warehouse = state.warehouse.clone();
    let response = blocking(move || {
        if !warehouse.ticker_exists(ticker.as_str())? {
            return Err(ApiError::BadRequest(format!("unknown ticker {ticker}")));
        }
        let prices = warehouse.closes_by_days(ticker.as_str(), days)?;
        if prices.is_empty() {
            return Err(ApiError::NotFound(format!(
                "no prices for {ticker} in the last {days} days"
            )));
        }
        Ok(json!({ "ticker": ticker.as_str(), "days": days, "prices": prices }))
    })
    .await?;
    Ok(Json(response).into_response())
}

#[derive(Debug, Deserialize, Default)]
struct LastNQuery {
    n: Option<u32>,
}

async fn stocks_last_n(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(query): Query<LastNQuery>,
) -> Result<Response, ApiError> {
    let ticker = parse_ticker(&ticker)?;
    let n = bounded(query.n, DEFAULT_LAST_N, MAX_LAST_N, "n")?;

    let warehouse = state.warehouse.clone();
    let response = blocking(move || {
        if !warehouse.ticker_exists(ticker.as_str())? {
            return Err(ApiError::BadRequest(format!("unknown ticker {ticker}")));
        }
        let prices = warehouse.closes_last_n(ticker.as_str(), n)?;
        if prices.is_empty() {
            return Err(ApiError::NotFound(format!("no prices for {ticker}")));
        }
        Ok(json!({ "ticker": ticker.as_str(), "n": n, "prices": prices }))
    })
    .await?;
    Ok(Json(response).into_response())
}

#[derive(Debug, Deserialize, Default)]
struct NewsQuery {
    days: Option<u32>,
    q: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

async fn news_by_days(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Response, ApiError> {
    let days = bounded(query.days, DEFAULT_NEWS_DAYS, MAX_NEWS_DAYS, "days")?;
    let limit = bounded(query.limit, DEFAULT_NEWS_LIMIT, MAX_NEWS_LIMIT, "limit")?;
    let offset = query.offset.unwrap_or(0);
    let q = query.q;

    let warehouse = state.warehouse.clone();
    let response = blocking(move || {
        let items = warehouse.news_by_days(days, q.as_deref(), limit, offset)?;
        if items.is_empty() {
            return Err(ApiError::NotFound("no news matched".to_owned()));
        }
        Ok(json!({ "days": days, "count": items.len(), "items": items }))
    })
    .await?;
    Ok(Json(response).into_response())
}

async fn news_last_n(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Response, ApiError> {
    let limit = bounded(query.limit, DEFAULT_NEWS_LIMIT, MAX_NEWS_LIMIT, "limit")?;
    let offset = query.offset.unwrap_or(0);

    let warehouse = state.warehouse.clone();
    let response = blocking(move || {
        let items = warehouse.news_last_n(limit, offset)?;
        if items.is_empty() {
            return Err(ApiError::NotFound("no news stored".to_owned()));
        }
        Ok(json!({ "count": items.len(), "items": items }))
    })
    .await?;
    Ok(Json(response).into_response())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stocks/:ticker", get(stocks_by_days))
        .route("/stocks/:ticker/last-n", get(stocks_last_n))
        .route("/news", get(news_by_days))
        .route("/news/last-n", get(news_last_n))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(warehouse: Warehouse, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "api listening");
    axum::serve(listener, app(AppState { warehouse })).await
}
