//! Derived-metrics computer.
//!
//! Pure functions mapping a raw bar (plus an optional previous close) to a
//! fully populated [`DailyStockRecord`] candidate. No I/O, no side effects.

use chrono::{NaiveDate, Utc};

use super::constants::ZERO_DIVISOR_FALLBACK;
use super::model::DailyStockRecord;
use crate::market_data::RawDailyBar;

/// Percentage ratio `numerator / denominator - 1`, with the shared fallback
/// when the denominator is zero.
pub fn pct_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        ZERO_DIVISOR_FALLBACK
    } else {
        numerator / denominator - 1.0
    }
}

/// Builds the record for `date` from a raw bar and the previous day's close.
///
/// `range` and `change` are always computed here; `gap` only when
/// `previous_close` is known. `needs_backfill` is set iff `gap` is absent,
/// keeping the flag and the field in lockstep on this write path.
pub fn compute_record(
    date: NaiveDate,
    bar: &RawDailyBar,
    previous_close: Option<f64>,
) -> DailyStockRecord {
    let gap = previous_close.map(|prev_close| pct_ratio(bar.open, prev_close));

    DailyStockRecord {
        date,
        symbol: bar.symbol.clone(),
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        volume: bar.volume.round() as i64,
        trades: bar.trades,
        range: pct_ratio(bar.high, bar.low),
        change: pct_ratio(bar.close, bar.open),
        needs_backfill: gap.is_none(),
        gap,
        created_at: Utc::now().naive_utc(),
    }
}
