//! Market data error types.

use thiserror::Error;

/// Errors that can occur while fetching raw daily bars from a provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("No data for {0}")]
    NoData(String),
}

impl MarketDataError {
    /// Returns true if this error is transient and the whole date is safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarketDataError::NetworkError(_) | MarketDataError::RateLimitExceeded
        )
    }
}
