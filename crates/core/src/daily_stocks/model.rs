//! Daily stock domain models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One persisted market-summary record, keyed by `(date, symbol)`.
///
/// `range` and `change` are derived from the record's own fields and are final
/// at ingestion time. `gap` depends on the previous trading day's close for
/// the same symbol, which may not be stored yet; until it is resolved the
/// record carries `gap: None` and `needs_backfill: true`.
///
/// Invariant: `needs_backfill == gap.is_none()` on every write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStockRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub trades: Option<i64>,
    pub range: f64,
    pub change: f64,
    pub gap: Option<f64>,
    pub needs_backfill: bool,
    pub created_at: NaiveDateTime,
}

/// One page of flagged records from the backfill scanner.
///
/// `cursor` is an opaque continuation token; passing it back to the scanner
/// yields the next page. `is_done` is true once the flagged set for the date
/// is exhausted as of this scan.
#[derive(Debug, Clone)]
pub struct BackfillPage {
    pub records: Vec<DailyStockRecord>,
    pub cursor: Option<String>,
    pub is_done: bool,
}

/// The previous calendar day.
///
/// Deliberately not trading-calendar aware: weekends and holidays are not
/// skipped. Records ingested on a Monday therefore stay flagged until a
/// Sunday record appears, which for equities never happens.
pub fn previous_calendar_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}
