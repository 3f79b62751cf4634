//! Daily stock pipeline error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors specific to the ingestion and backfill pipeline.
#[derive(Error, Debug)]
pub enum DailyStockError {
    /// A backfill run for this date is already in flight. Two overlapping
    /// runs would double-process pages, so at most one is allowed per date.
    #[error("Backfill already running for {0}")]
    BackfillInProgress(NaiveDate),

    /// The target date has no previous calendar day (chrono's minimum date).
    #[error("No previous calendar day for {0}")]
    DateOutOfRange(NaiveDate),
}
