//! Background scheduler for the daily ingest-then-backfill pass.
//!
//! Ingests the previous calendar day once every 24 hours, then runs a
//! backfill sweep over that date to resolve gaps left by the prior day's
//! ingestion.

use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::main_lib::AppState;
use gapfill_core::daily_stocks::{previous_calendar_day, DailyStockError};
use gapfill_core::Error;

/// Ingest interval: 24 hours (one grouped-daily snapshot per day upstream)
const INGEST_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Initial delay before first run (60 seconds to let server fully start)
const INITIAL_DELAY_SECS: u64 = 60;

/// Starts the background daily ingestion scheduler.
pub fn start_daily_ingest_scheduler(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!("Daily ingest scheduler started (24-hour interval)");

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        // First tick is immediate, subsequent ticks are 24h apart
        let mut ingest_interval = interval(Duration::from_secs(INGEST_INTERVAL_SECS));

        loop {
            ingest_interval.tick().await;
            run_scheduled_ingest(&state).await;
        }
    });
}

/// Runs one scheduled ingest-then-backfill pass for yesterday's date.
async fn run_scheduled_ingest(state: &Arc<AppState>) {
    let today = chrono::Utc::now().date_naive();
    let Some(date) = previous_calendar_day(today) else {
        warn!("Scheduled ingest skipped: no previous day for {}", today);
        return;
    };

    info!("Running scheduled ingest for {}...", date);
    match state.ingestion_service.ingest(date).await {
        Ok(summary) => {
            info!(
                "Scheduled ingest for {} completed: {} records written, {} pending backfill",
                date, summary.records_written, summary.pending_backfill
            );
        }
        Err(Error::MarketData(e)) if e.is_transient() => {
            info!(
                "Scheduled ingest for {} hit a transient provider error ({}); retrying next cycle",
                date, e
            );
            return;
        }
        Err(e) => {
            warn!("Scheduled ingest for {} failed: {}", date, e);
            return;
        }
    }

    match state.backfill_service.run_to_completion(date).await {
        Ok(summary) => {
            info!(
                "Scheduled backfill for {} completed: {} resolved over {} steps",
                date, summary.resolved, summary.steps
            );
        }
        Err(Error::DailyStock(DailyStockError::BackfillInProgress(_))) => {
            info!("Scheduled backfill for {} skipped: already running", date);
        }
        Err(e) => {
            warn!("Scheduled backfill for {} failed: {}", date, e);
        }
    }
}
