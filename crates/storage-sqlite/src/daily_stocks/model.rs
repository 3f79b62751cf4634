//! Database row type for daily stock records.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use gapfill_core::daily_stocks::DailyStockRecord;

/// Database model for the `daily_stocks` table, keyed by `(date, symbol)`.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::daily_stocks)]
#[diesel(primary_key(date, symbol))]
#[diesel(treat_none_as_default_value = false)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyStockRecordDB {
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

impl From<DailyStockRecordDB> for DailyStockRecord {
    fn from(db: DailyStockRecordDB) -> Self {
        DailyStockRecord {
            date: db.date,
            symbol: db.symbol,
            open: db.open,
            high: db.high,
            low: db.low,
            close: db.close,
            volume: db.volume,
            trades: db.trades,
            range: db.range,
            change: db.change,
            gap: db.gap,
            needs_backfill: db.needs_backfill,
            created_at: db.created_at,
        }
    }
}

impl From<&DailyStockRecord> for DailyStockRecordDB {
    fn from(domain: &DailyStockRecord) -> Self {
        Self {
            date: domain.date,
            symbol: domain.symbol.clone(),
            open: domain.open,
            high: domain.high,
            low: domain.low,
            close: domain.close,
            volume: domain.volume,
            trades: domain.trades,
            range: domain.range,
            change: domain.change,
            gap: domain.gap,
            needs_backfill: domain.needs_backfill,
            created_at: domain.created_at,
        }
    }
}
