use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::upsert::excluded;
use std::sync::Arc;

use super::model::DailyStockRecordDB;
use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::schema::daily_stocks::dsl as daily_stocks_dsl;
use gapfill_core::daily_stocks::{BackfillPage, DailyStockRecord, DailyStockStore};
use gapfill_core::Result;

pub struct DailyStockRepository {
    pool: Arc<DbPool>,
}

impl DailyStockRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DailyStockStore for DailyStockRepository {
    fn get(&self, date: NaiveDate, symbol: &str) -> Result<Option<DailyStockRecord>> {
        let mut conn = get_connection(&self.pool)?;

        daily_stocks_dsl::daily_stocks
            .filter(daily_stocks_dsl::date.eq(date))
            .filter(daily_stocks_dsl::symbol.eq(symbol))
            .first::<DailyStockRecordDB>(&mut conn)
            .optional()
            .into_core()
            .map(|row| row.map(DailyStockRecord::from))
    }

    async fn upsert_batch(&self, records: &[DailyStockRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let db_rows: Vec<DailyStockRecordDB> =
            records.iter().map(DailyStockRecordDB::from).collect();

        let mut conn = get_connection(&self.pool)?;
        conn.immediate_transaction(|conn| {
            // The conflict target is the (date, symbol) primary key, so
            // re-ingesting a date overwrites rather than duplicates.
            // created_at is not in the update set: the existing row keeps its
            // original timestamp, making repeated ingestion of identical data
            // byte-stable.
            diesel::insert_into(daily_stocks_dsl::daily_stocks)
                .values(&db_rows)
                .on_conflict((daily_stocks_dsl::date, daily_stocks_dsl::symbol))
                .do_update()
                .set((
                    daily_stocks_dsl::open.eq(excluded(daily_stocks_dsl::open)),
                    daily_stocks_dsl::high.eq(excluded(daily_stocks_dsl::high)),
                    daily_stocks_dsl::low.eq(excluded(daily_stocks_dsl::low)),
                    daily_stocks_dsl::close.eq(excluded(daily_stocks_dsl::close)),
                    daily_stocks_dsl::volume.eq(excluded(daily_stocks_dsl::volume)),
                    daily_stocks_dsl::trades.eq(excluded(daily_stocks_dsl::trades)),
                    daily_stocks_dsl::range.eq(excluded(daily_stocks_dsl::range)),
                    daily_stocks_dsl::change.eq(excluded(daily_stocks_dsl::change)),
                    daily_stocks_dsl::gap.eq(excluded(daily_stocks_dsl::gap)),
                    daily_stocks_dsl::needs_backfill
                        .eq(excluded(daily_stocks_dsl::needs_backfill)),
                ))
                .execute(conn)
        })
        .into_core()
    }

    fn list_needs_backfill(
        &self,
        date: NaiveDate,
        cursor: Option<&str>,
        limit: i64,
    ) -> Result<BackfillPage> {
        let mut conn = get_connection(&self.pool)?;

        // Fetch one row past the limit to learn whether another page exists
        // without a second count query.
        let mut query = daily_stocks_dsl::daily_stocks
            .filter(daily_stocks_dsl::date.eq(date))
            .filter(daily_stocks_dsl::needs_backfill.eq(true))
            .order(daily_stocks_dsl::symbol.asc())
            .limit(limit + 1)
            .into_boxed();

        if let Some(after_symbol) = cursor {
            query = query.filter(daily_stocks_dsl::symbol.gt(after_symbol.to_string()));
        }

        let mut rows = query.load::<DailyStockRecordDB>(&mut conn).into_core()?;

        let is_done = rows.len() as i64 <= limit;
        rows.truncate(limit as usize);
        let cursor = if is_done {
            None
        } else {
            rows.last().map(|row| row.symbol.clone())
        };

        Ok(BackfillPage {
            records: rows.into_iter().map(DailyStockRecord::from).collect(),
            cursor,
            is_done,
        })
    }

    async fn apply_gap(&self, date: NaiveDate, symbol: &str, gap: f64) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        diesel::update(
            daily_stocks_dsl::daily_stocks
                .filter(daily_stocks_dsl::date.eq(date))
                .filter(daily_stocks_dsl::symbol.eq(symbol)),
        )
        .set((
            daily_stocks_dsl::gap.eq(Some(gap)),
            daily_stocks_dsl::needs_backfill.eq(false),
        ))
        .execute(&mut conn)
        .into_core()?;

        Ok(())
    }
}
