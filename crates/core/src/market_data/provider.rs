use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::errors::MarketDataError;

/// One raw OHLCV bar as returned by the upstream market-summary API.
///
/// Field names follow the wire format of the grouped-daily endpoint:
/// `T` symbol, `o/h/l/c` prices, `v` volume, `n` trade count, `t` the
/// bar's epoch-millisecond timestamp (unused downstream but present on
/// every row).
#[derive(Debug, Clone, Deserialize)]
pub struct RawDailyBar {
    #[serde(rename = "T")]
    pub symbol: String,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n")]
    pub trades: Option<i64>,
    #[serde(rename = "t")]
    pub timestamp: Option<i64>,
}

/// Source of raw daily bars, one per traded symbol for a calendar date.
///
/// A non-success response from the upstream API is a hard failure for the
/// whole date; the ingestion writer aborts and the caller retries the date.
#[async_trait]
pub trait DailyBarProvider: Send + Sync {
    /// Provider identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetches all bars for the given calendar date.
    ///
    /// Returns an error when the upstream request fails, returns a non-2xx
    /// status, or reports no results for the date.
    async fn fetch_daily_bars(&self, date: NaiveDate) -> Result<Vec<RawDailyBar>, MarketDataError>;
}
