//! Deferred-gap backfill.
//!
//! Resolves records that were ingested before their previous day's close was
//! stored. Work is split into discrete steps: each step scans one page of
//! flagged records, resolves what it can, and hands back a continuation
//! cursor. A step is idempotent and safe to repeat; a crash between steps
//! loses at most one page of progress.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use log::{debug, info, warn};
use serde::Serialize;

use super::constants::BACKFILL_PAGE_SIZE;
use super::errors::DailyStockError;
use super::metrics::pct_ratio;
use super::model::previous_calendar_day;
use super::store::DailyStockStore;
use crate::errors::Result;

/// Outcome of a single scan/resolve step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillStep {
    /// Flagged records examined on this page.
    pub scanned: usize,
    /// Records whose gap was resolved and persisted.
    pub resolved: usize,
    /// Continuation cursor for the next step, when not done.
    pub cursor: Option<String>,
    /// True once the flagged set for the date is exhausted.
    pub done: bool,
}

/// Aggregate outcome of driving the orchestrator to completion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillSummary {
    pub date: NaiveDate,
    pub steps: usize,
    pub scanned: usize,
    pub resolved: usize,
}

/// Scanner, resolver and orchestrator for the deferred-gap backfill.
pub struct BackfillService {
    store: Arc<dyn DailyStockStore>,
    in_flight: DashMap<NaiveDate, ()>,
}

impl BackfillService {
    pub fn new(store: Arc<dyn DailyStockStore>) -> Self {
        Self {
            store,
            in_flight: DashMap::new(),
        }
    }

    /// Runs one scan/resolve step for `date`, resuming from `cursor`.
    ///
    /// Each flagged record on the page is resolved independently: a record
    /// whose previous day's close is still missing is skipped, not an error,
    /// and stays flagged for a future pass. Re-running a step is a no-op for
    /// already-resolved records because the scanner no longer selects them.
    ///
    /// The step holds the per-date in-flight slot while it runs, so an
    /// externally chained step cannot overlap a [`run_to_completion`] sweep
    /// for the same date (or another step); it fails with
    /// `BackfillInProgress` instead.
    ///
    /// [`run_to_completion`]: BackfillService::run_to_completion
    pub async fn run_step(&self, date: NaiveDate, cursor: Option<&str>) -> Result<BackfillStep> {
        let _guard = InFlightGuard::acquire(&self.in_flight, date)?;
        self.step(date, cursor).await
    }

    async fn step(&self, date: NaiveDate, cursor: Option<&str>) -> Result<BackfillStep> {
        let previous_date =
            previous_calendar_day(date).ok_or(DailyStockError::DateOutOfRange(date))?;

        let page = self
            .store
            .list_needs_backfill(date, cursor, BACKFILL_PAGE_SIZE)?;

        let mut resolved = 0;
        for record in &page.records {
            match self.store.get(previous_date, &record.symbol)? {
                Some(previous) => {
                    let gap = pct_ratio(record.open, previous.close);
                    self.store.apply_gap(date, &record.symbol, gap).await?;
                    resolved += 1;
                }
                None => {
                    debug!(
                        "No {} record for {} yet; leaving {} flagged",
                        previous_date, record.symbol, date
                    );
                }
            }
        }

        Ok(BackfillStep {
            scanned: page.records.len(),
            resolved,
            cursor: page.cursor,
            done: page.is_done,
        })
    }

    /// Drives scan/resolve steps for `date` until the flagged set is exhausted.
    ///
    /// At most one run per date may be in flight; overlapping runs would
    /// double-process pages. Concurrent ingestion for the same date is the
    /// caller's responsibility to sequence (ingest fully, then backfill).
    pub async fn run_to_completion(&self, date: NaiveDate) -> Result<BackfillSummary> {
        let _guard = InFlightGuard::acquire(&self.in_flight, date)?;

        let mut summary = BackfillSummary {
            date,
            steps: 0,
            scanned: 0,
            resolved: 0,
        };
        let mut cursor: Option<String> = None;

        loop {
            let step = self.step(date, cursor.as_deref()).await?;
            summary.steps += 1;
            summary.scanned += step.scanned;
            summary.resolved += step.resolved;

            if step.done {
                break;
            }
            cursor = step.cursor;
        }

        if summary.scanned > summary.resolved {
            warn!(
                "Backfill for {} left {} records flagged (previous day missing)",
                date,
                summary.scanned - summary.resolved
            );
        }
        info!(
            "Backfill for {} done: {} resolved of {} scanned in {} steps",
            date, summary.resolved, summary.scanned, summary.steps
        );

        Ok(summary)
    }
}

/// Removes the date from the in-flight set when the run ends, on any path.
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<NaiveDate, ()>,
    date: NaiveDate,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(
        in_flight: &'a DashMap<NaiveDate, ()>,
        date: NaiveDate,
    ) -> std::result::Result<Self, DailyStockError> {
        match in_flight.entry(date) {
            dashmap::Entry::Occupied(_) => Err(DailyStockError::BackfillInProgress(date)),
            dashmap::Entry::Vacant(slot) => {
                slot.insert(());
                Ok(Self { in_flight, date })
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.date);
    }
}
