use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::errors::MarketDataError;
use super::provider::{DailyBarProvider, RawDailyBar};

const DEFAULT_BASE_URL: &str = "https://api.massive.com";
const GROUPED_DAILY_PATH: &str = "/v2/aggs/grouped/locale/us/market/stocks";

/// Configuration for the Massive grouped-daily endpoint.
///
/// The API key and base URL are passed in explicitly rather than read from
/// the environment inside the provider, so tests and callers control them.
#[derive(Debug, Clone)]
pub struct MassiveConfig {
    pub api_key: String,
    pub base_url: String,
}

impl MassiveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GroupedDailyResponse {
    status: String,
    #[serde(rename = "resultsCount")]
    results_count: Option<i64>,
    results: Option<Vec<RawDailyBar>>,
}

/// Daily market-summary provider backed by the Massive HTTP API.
pub struct MassiveProvider {
    client: Client,
    config: MassiveConfig,
}

impl MassiveProvider {
    pub fn new(config: MassiveConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl DailyBarProvider for MassiveProvider {
    fn name(&self) -> &'static str {
        "MASSIVE"
    }

    async fn fetch_daily_bars(&self, date: NaiveDate) -> Result<Vec<RawDailyBar>, MarketDataError> {
        let url = format!(
            "{}{}/{}",
            self.config.base_url,
            GROUPED_DAILY_PATH,
            date.format("%Y-%m-%d")
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.config.api_key.as_str()),
                ("adjusted", "true"),
                ("include_otc", "false"),
            ])
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(MarketDataError::Unauthorized(
                    "Massive API rejected the API key".to_string(),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(MarketDataError::RateLimitExceeded),
            s => {
                return Err(MarketDataError::ProviderError(format!(
                    "Massive grouped-daily request failed with status {}",
                    s
                )));
            }
        }

        let body: GroupedDailyResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;

        if !body.status.eq_ignore_ascii_case("ok") {
            return Err(MarketDataError::ProviderError(format!(
                "Massive returned status '{}' for {}",
                body.status, date
            )));
        }

        let bars = match body.results {
            Some(bars) if body.results_count.unwrap_or(bars.len() as i64) > 0 => bars,
            _ => return Err(MarketDataError::NoData(date.to_string())),
        };

        debug!("Fetched {} bars for {}", bars.len(), date);
        Ok(bars)
    }
}
