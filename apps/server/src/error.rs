//! HTTP error mapping for API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use gapfill_core::daily_stocks::DailyStockError;
use gapfill_core::market_data::MarketDataError;
use gapfill_core::{DatabaseError, Error};

pub type ApiResult<T> = Result<T, ApiError>;

/// Wrapper turning core errors into HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::DailyStock(DailyStockError::BackfillInProgress(_)) => StatusCode::CONFLICT,
            Error::DailyStock(DailyStockError::DateOutOfRange(_)) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::MarketData(MarketDataError::Unauthorized(_)) => StatusCode::BAD_GATEWAY,
            Error::MarketData(MarketDataError::RateLimitExceeded) => StatusCode::BAD_GATEWAY,
            Error::MarketData(MarketDataError::NoData(_)) => StatusCode::NOT_FOUND,
            Error::MarketData(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
