//! Ingestion writer.
//!
//! Fetches one day of raw bars from the provider, derives per-record metrics,
//! resolves `gap` immediately where the previous day's close is already
//! stored, and upserts the results in bounded-size batches.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use super::constants::INGEST_CHUNK_SIZE;
use super::errors::DailyStockError;
use super::metrics::compute_record;
use super::model::previous_calendar_day;
use super::store::DailyStockStore;
use crate::errors::Result;
use crate::market_data::DailyBarProvider;

/// Outcome of one `ingest(date)` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub date: NaiveDate,
    pub records_written: usize,
    pub pending_backfill: usize,
}

pub struct IngestionService {
    store: Arc<dyn DailyStockStore>,
    provider: Arc<dyn DailyBarProvider>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn DailyStockStore>, provider: Arc<dyn DailyBarProvider>) -> Self {
        Self { store, provider }
    }

    /// Ingests all bars for `date`.
    ///
    /// A provider failure aborts the whole date before any write; re-running
    /// after a partial failure is safe because writes are idempotent upserts.
    /// Bars are processed in provider order, in chunks of
    /// [`INGEST_CHUNK_SIZE`], with no state carried between chunks.
    pub async fn ingest(&self, date: NaiveDate) -> Result<IngestSummary> {
        let bars = self.provider.fetch_daily_bars(date).await?;
        let previous_date =
            previous_calendar_day(date).ok_or(DailyStockError::DateOutOfRange(date))?;

        info!(
            "Ingesting {} bars for {} from {}",
            bars.len(),
            date,
            self.provider.name()
        );

        let mut records_written = 0;
        let mut pending_backfill = 0;

        for chunk in bars.chunks(INGEST_CHUNK_SIZE) {
            let mut records = Vec::with_capacity(chunk.len());
            for bar in chunk {
                let previous_close = self
                    .store
                    .get(previous_date, &bar.symbol)?
                    .map(|prev| prev.close);
                let record = compute_record(date, bar, previous_close);
                if record.needs_backfill {
                    pending_backfill += 1;
                }
                records.push(record);
            }

            records_written += self.store.upsert_batch(&records).await?;
            debug!("Inserted {} / {} stocks for {}", records_written, bars.len(), date);
        }

        info!(
            "Ingested {} for {}: {} flagged for backfill",
            records_written, date, pending_backfill
        );

        Ok(IngestSummary {
            date,
            records_written,
            pending_backfill,
        })
    }
}
