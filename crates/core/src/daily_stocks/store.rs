//! Daily stock storage trait.
//!
//! Abstracts the persistence layer so the ingestion and backfill services can
//! be tested against in-memory implementations and the SQLite backend stays
//! confined to the storage crate.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::{BackfillPage, DailyStockRecord};
use crate::errors::Result;

/// Storage interface for daily stock records.
///
/// Async methods are used for mutations; sync methods for point and page
/// reads, matching how the repository executes them.
#[async_trait]
pub trait DailyStockStore: Send + Sync {
    /// Point lookup by the natural key `(date, symbol)`.
    fn get(&self, date: NaiveDate, symbol: &str) -> Result<Option<DailyStockRecord>>;

    /// Upserts a batch of records keyed by `(date, symbol)`.
    ///
    /// Existing records for the same key are overwritten, never duplicated,
    /// which is what makes re-ingestion of a date safe to retry. An existing
    /// row keeps its `created_at`, so re-ingesting identical upstream data
    /// leaves the stored record unchanged.
    ///
    /// Returns the number of records written.
    async fn upsert_batch(&self, records: &[DailyStockRecord]) -> Result<usize>;

    /// Returns up to `limit` records for `date` with `needs_backfill == true`,
    /// resuming after `cursor` when given.
    ///
    /// Pagination is stable under the resolver's own writes: resolved records
    /// drop out of the flagged set, and the cursor orders by symbol so no
    /// still-flagged record behind the cursor is revisited within one sweep.
    fn list_needs_backfill(
        &self,
        date: NaiveDate,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<BackfillPage>;

    /// Sets `gap` and clears `needs_backfill` for one record, atomically.
    ///
    /// The two fields must never diverge; this is the only mutation path
    /// after ingestion and it patches both together.
    async fn apply_gap(&self, date: NaiveDate, symbol: &str, gap: f64) -> Result<()>;
}
