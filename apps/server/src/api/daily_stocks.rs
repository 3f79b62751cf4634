use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};
use gapfill_core::daily_stocks::{
    BackfillStep, BackfillSummary, DailyStockRecord, IngestSummary,
};
use gapfill_core::{DatabaseError, Error};

/// Fetch, derive, and upsert one day of market summaries.
async fn ingest_daily_stocks(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Json<IngestSummary>> {
    let summary = state.ingestion_service.ingest(date).await?;
    Ok(Json(summary))
}

/// Resolve all flagged gaps for a date, sweeping page by page until done.
async fn backfill_daily_stocks(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Json<BackfillSummary>> {
    let summary = state.backfill_service.run_to_completion(date).await?;
    Ok(Json(summary))
}

#[derive(Deserialize)]
struct StepQuery {
    cursor: Option<String>,
}

/// Run one scan/resolve step; the caller chains steps with the returned cursor.
async fn backfill_step(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<StepQuery>,
) -> ApiResult<Json<BackfillStep>> {
    let step = state
        .backfill_service
        .run_step(date, query.cursor.as_deref())
        .await?;
    Ok(Json(step))
}

async fn get_daily_stock(
    State(state): State<Arc<AppState>>,
    Path((date, symbol)): Path<(NaiveDate, String)>,
) -> ApiResult<Json<DailyStockRecord>> {
    let record = state
        .store
        .get(date, &symbol)?
        .ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!(
                "No record for {} on {}",
                symbol, date
            )))
        })?;
    Ok(Json(record))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/daily-stocks/{date}/ingest", post(ingest_daily_stocks))
        .route("/daily-stocks/{date}/backfill", post(backfill_daily_stocks))
        .route("/daily-stocks/{date}/backfill/step", post(backfill_step))
        .route("/daily-stocks/{date}/{symbol}", get(get_daily_stock))
}
