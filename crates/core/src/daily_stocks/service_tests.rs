//! Tests for the ingestion writer and backfill orchestrator contracts.
//!
//! These run against in-memory mock implementations of [`DailyStockStore`]
//! and [`DailyBarProvider`] and cover the pipeline's core properties:
//! idempotent ingestion, flag/gap consistency, backfill convergence,
//! stability under a missing dependency, and pagination completeness.

#[cfg(test)]
mod tests {
    use crate::daily_stocks::{
        BackfillPage, BackfillService, DailyStockError, DailyStockRecord, DailyStockStore,
        IngestionService, BACKFILL_PAGE_SIZE,
    };
    use crate::errors::{Error, Result};
    use crate::market_data::{DailyBarProvider, MarketDataError, RawDailyBar};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // =========================================================================
    // Mock DailyStockStore
    // =========================================================================

    #[derive(Default)]
    struct MockStore {
        records: Mutex<Vec<DailyStockRecord>>,
        scan_calls: AtomicUsize,
        gap_writes: Mutex<HashMap<String, usize>>,
        scan_delay: Option<Duration>,
    }

    impl MockStore {
        fn new() -> Self {
            Self::default()
        }

        fn with_scan_delay(delay: Duration) -> Self {
            Self {
                scan_delay: Some(delay),
                ..Self::default()
            }
        }

        fn all(&self) -> Vec<DailyStockRecord> {
            self.records.lock().unwrap().clone()
        }

        fn scan_calls(&self) -> usize {
            self.scan_calls.load(Ordering::SeqCst)
        }

        fn gap_write_counts(&self) -> HashMap<String, usize> {
            self.gap_writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DailyStockStore for MockStore {
        fn get(&self, date: NaiveDate, symbol: &str) -> Result<Option<DailyStockRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .find(|r| r.date == date && r.symbol == symbol)
                .cloned())
        }

        async fn upsert_batch(&self, batch: &[DailyStockRecord]) -> Result<usize> {
            let mut records = self.records.lock().unwrap();
            for record in batch {
                // Same key overwrites, but the original created_at survives,
                // matching the store contract.
                if let Some(existing) = records
                    .iter_mut()
                    .find(|r| r.date == record.date && r.symbol == record.symbol)
                {
                    let created_at = existing.created_at;
                    *existing = record.clone();
                    existing.created_at = created_at;
                } else {
                    records.push(record.clone());
                }
            }
            Ok(batch.len())
        }

        fn list_needs_backfill(
            &self,
            date: NaiveDate,
            cursor: Option<&str>,
            limit: i64,
        ) -> Result<BackfillPage> {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.scan_delay {
                std::thread::sleep(delay);
            }

            let records = self.records.lock().unwrap();
            let mut flagged: Vec<DailyStockRecord> = records
                .iter()
                .filter(|r| r.date == date && r.needs_backfill)
                .filter(|r| cursor.map_or(true, |c| r.symbol.as_str() > c))
                .cloned()
                .collect();
            flagged.sort_by(|a, b| a.symbol.cmp(&b.symbol));

            let is_done = flagged.len() as i64 <= limit;
            flagged.truncate(limit as usize);
            let cursor = if is_done {
                None
            } else {
                flagged.last().map(|r| r.symbol.clone())
            };

            Ok(BackfillPage {
                records: flagged,
                cursor,
                is_done,
            })
        }

        async fn apply_gap(&self, date: NaiveDate, symbol: &str, gap: f64) -> Result<()> {
            *self
                .gap_writes
                .lock()
                .unwrap()
                .entry(symbol.to_string())
                .or_insert(0) += 1;

            let mut records = self.records.lock().unwrap();
            if let Some(record) = records
                .iter_mut()
                .find(|r| r.date == date && r.symbol == symbol)
            {
                record.gap = Some(gap);
                record.needs_backfill = false;
            }
            Ok(())
        }
    }

    // =========================================================================
    // Mock DailyBarProvider
    // =========================================================================

    #[derive(Default)]
    struct MockProvider {
        bars_by_date: HashMap<NaiveDate, Vec<RawDailyBar>>,
        fail: bool,
    }

    impl MockProvider {
        fn with_bars(date: NaiveDate, bars: Vec<RawDailyBar>) -> Self {
            let mut bars_by_date = HashMap::new();
            bars_by_date.insert(date, bars);
            Self {
                bars_by_date,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DailyBarProvider for MockProvider {
        fn name(&self) -> &'static str {
            "MOCK"
        }

        async fn fetch_daily_bars(
            &self,
            date: NaiveDate,
        ) -> std::result::Result<Vec<RawDailyBar>, MarketDataError> {
            if self.fail {
                return Err(MarketDataError::ProviderError(
                    "upstream unavailable".to_string(),
                ));
            }
            self.bars_by_date
                .get(&date)
                .cloned()
                .ok_or_else(|| MarketDataError::NoData(date.to_string()))
        }
    }

    // =========================================================================
    // Test Helpers
    // =========================================================================

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn bar(symbol: &str, open: f64, high: f64, low: f64, close: f64) -> RawDailyBar {
        RawDailyBar {
            symbol: symbol.to_string(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
            trades: None,
            timestamp: None,
        }
    }

    async fn seed_flagged(store: &MockStore, day: NaiveDate, symbols: &[String]) {
        let records: Vec<DailyStockRecord> = symbols
            .iter()
            .map(|symbol| {
                crate::daily_stocks::compute_record(day, &bar(symbol, 100.0, 101.0, 99.0, 100.5), None)
            })
            .collect();
        store.upsert_batch(&records).await.unwrap();
    }

    async fn seed_previous_closes(store: &MockStore, day: NaiveDate, symbols: &[String]) {
        let records: Vec<DailyStockRecord> = symbols
            .iter()
            .map(|symbol| {
                crate::daily_stocks::compute_record(
                    day,
                    &bar(symbol, 98.0, 99.5, 97.0, 99.0),
                    Some(97.5),
                )
            })
            .collect();
        store.upsert_batch(&records).await.unwrap();
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    #[tokio::test]
    async fn test_ingest_flags_record_when_previous_day_missing() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        let provider = Arc::new(MockProvider::with_bars(
            target,
            vec![bar("AAPL", 100.0, 101.0, 99.0, 100.5)],
        ));
        let service = IngestionService::new(store.clone(), provider);

        let summary = service.ingest(target).await.unwrap();
        assert_eq!(summary.records_written, 1);
        assert_eq!(summary.pending_backfill, 1);

        let record = store.get(target, "AAPL").unwrap().unwrap();
        assert!((record.range - (101.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert!((record.change - 0.005).abs() < 1e-12);
        assert!(record.gap.is_none());
        assert!(record.needs_backfill);
    }

    #[tokio::test]
    async fn test_ingest_resolves_gap_when_previous_close_stored() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        seed_previous_closes(&store, date(2026, 2, 19), &["AAPL".to_string()]).await;

        let provider = Arc::new(MockProvider::with_bars(
            target,
            vec![bar("AAPL", 100.0, 101.0, 99.0, 100.5)],
        ));
        let service = IngestionService::new(store.clone(), provider);

        let summary = service.ingest(target).await.unwrap();
        assert_eq!(summary.pending_backfill, 0);

        let record = store.get(target, "AAPL").unwrap().unwrap();
        let gap = record.gap.unwrap();
        assert!((gap - (100.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert!(!record.needs_backfill);
    }

    #[tokio::test]
    async fn test_ingest_twice_does_not_duplicate() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        let provider = Arc::new(MockProvider::with_bars(
            target,
            vec![
                bar("AAPL", 100.0, 101.0, 99.0, 100.5),
                bar("MSFT", 350.0, 352.5, 348.0, 351.0),
            ],
        ));
        let service = IngestionService::new(store.clone(), provider);

        service.ingest(target).await.unwrap();
        service.ingest(target).await.unwrap();

        assert_eq!(store.all().len(), 2);
    }

    #[tokio::test]
    async fn test_reingesting_identical_data_leaves_records_unchanged() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        seed_previous_closes(&store, date(2026, 2, 19), &["AAPL".to_string()]).await;

        let provider = Arc::new(MockProvider::with_bars(
            target,
            vec![
                bar("AAPL", 100.0, 101.0, 99.0, 100.5),
                bar("NEWCO", 10.0, 11.0, 9.5, 10.2),
            ],
        ));
        let service = IngestionService::new(store.clone(), provider);

        service.ingest(target).await.unwrap();
        let mut before = store.all();
        before.sort_by(|a, b| (a.date, a.symbol.clone()).cmp(&(b.date, b.symbol.clone())));

        service.ingest(target).await.unwrap();
        let mut after = store.all();
        after.sort_by(|a, b| (a.date, a.symbol.clone()).cmp(&(b.date, b.symbol.clone())));

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_ingest_aborts_on_provider_failure_without_writes() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        let service = IngestionService::new(store.clone(), Arc::new(MockProvider::failing()));

        let result = service.ingest(target).await;
        assert!(matches!(result, Err(Error::MarketData(_))));
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_flag_and_gap_never_diverge_across_the_pipeline() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        seed_previous_closes(&store, date(2026, 2, 19), &["AAPL".to_string()]).await;

        let provider = Arc::new(MockProvider::with_bars(
            target,
            vec![
                bar("AAPL", 100.0, 101.0, 99.0, 100.5),
                bar("NEWCO", 10.0, 11.0, 9.5, 10.2),
            ],
        ));
        IngestionService::new(store.clone(), provider)
            .ingest(target)
            .await
            .unwrap();
        BackfillService::new(store.clone())
            .run_to_completion(target)
            .await
            .unwrap();

        for record in store.all() {
            assert_eq!(record.needs_backfill, record.gap.is_none());
        }
    }

    // =========================================================================
    // Backfill
    // =========================================================================

    #[tokio::test]
    async fn test_backfill_converges_and_is_idempotent() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        seed_flagged(&store, target, &["AAPL".to_string()]).await;

        // The missing day arrives later.
        seed_previous_closes(&store, date(2026, 2, 19), &["AAPL".to_string()]).await;

        let service = BackfillService::new(store.clone());
        let summary = service.run_to_completion(target).await.unwrap();
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.resolved, 1);

        let record = store.get(target, "AAPL").unwrap().unwrap();
        let gap = record.gap.unwrap();
        assert!((gap - (100.0 / 99.0 - 1.0)).abs() < 1e-12);
        assert!(!record.needs_backfill);

        // Second run scans nothing: the record is no longer selected.
        let summary = service.run_to_completion(target).await.unwrap();
        assert_eq!(summary.scanned, 0);
        assert_eq!(summary.resolved, 0);
        assert_eq!(store.gap_write_counts().get("AAPL"), Some(&1));
    }

    #[tokio::test]
    async fn test_backfill_leaves_record_flagged_while_dependency_missing() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());
        seed_flagged(&store, target, &["AAPL".to_string()]).await;

        let service = BackfillService::new(store.clone());
        for _ in 0..3 {
            let summary = service.run_to_completion(target).await.unwrap();
            assert_eq!(summary.resolved, 0);
        }

        let record = store.get(target, "AAPL").unwrap().unwrap();
        assert!(record.needs_backfill);
        assert!(record.gap.is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_record_does_not_block_rest_of_page() {
        let target = date(2026, 2, 20);
        let previous = date(2026, 2, 19);
        let store = Arc::new(MockStore::new());

        seed_flagged(
            &store,
            target,
            &["AAA".to_string(), "BBB".to_string(), "CCC".to_string()],
        )
        .await;
        // BBB's previous day never arrives.
        seed_previous_closes(&store, previous, &["AAA".to_string(), "CCC".to_string()]).await;

        let summary = BackfillService::new(store.clone())
            .run_to_completion(target)
            .await
            .unwrap();
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.resolved, 2);

        assert!(!store.get(target, "AAA").unwrap().unwrap().needs_backfill);
        assert!(store.get(target, "BBB").unwrap().unwrap().needs_backfill);
        assert!(!store.get(target, "CCC").unwrap().unwrap().needs_backfill);
    }

    #[tokio::test]
    async fn test_pagination_visits_every_flagged_record_exactly_once() {
        let target = date(2026, 2, 20);
        let previous = date(2026, 2, 19);
        let store = Arc::new(MockStore::new());

        let count = (BACKFILL_PAGE_SIZE * 2 + BACKFILL_PAGE_SIZE / 2) as usize;
        let symbols: Vec<String> = (0..count).map(|i| format!("SYM{:04}", i)).collect();
        seed_flagged(&store, target, &symbols).await;
        seed_previous_closes(&store, previous, &symbols).await;

        let summary = BackfillService::new(store.clone())
            .run_to_completion(target)
            .await
            .unwrap();

        assert_eq!(summary.scanned, count);
        assert_eq!(summary.resolved, count);
        assert_eq!(summary.steps, 3);

        let writes = store.gap_write_counts();
        assert_eq!(writes.len(), count);
        assert!(writes.values().all(|&n| n == 1));
    }

    #[tokio::test]
    async fn test_scanner_reports_done_exactly_at_exhaustion() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());

        // Exactly one full page of flagged records.
        let symbols: Vec<String> = (0..BACKFILL_PAGE_SIZE as usize)
            .map(|i| format!("SYM{:04}", i))
            .collect();
        seed_flagged(&store, target, &symbols).await;

        let service = BackfillService::new(store.clone());
        let step = service.run_step(target, None).await.unwrap();
        assert_eq!(step.scanned, BACKFILL_PAGE_SIZE as usize);
        assert!(step.done);
        assert!(step.cursor.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_at_most_one_backfill_in_flight_per_date() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::with_scan_delay(Duration::from_millis(200)));
        seed_flagged(&store, target, &["AAPL".to_string()]).await;

        let service = Arc::new(BackfillService::new(store.clone()));
        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.run_to_completion(target).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = service.run_to_completion(target).await;
        assert!(matches!(
            second,
            Err(Error::DailyStock(DailyStockError::BackfillInProgress(_)))
        ));

        // The first run still completes normally.
        assert!(first.await.unwrap().is_ok());

        // Once released, a new run is accepted again.
        assert!(service.run_to_completion(target).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_single_step_rejected_while_full_run_in_flight() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::with_scan_delay(Duration::from_millis(200)));
        seed_flagged(&store, target, &["AAPL".to_string()]).await;

        let service = Arc::new(BackfillService::new(store.clone()));
        let full_run = {
            let service = service.clone();
            tokio::spawn(async move { service.run_to_completion(target).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let step = service.run_step(target, None).await;
        assert!(matches!(
            step,
            Err(Error::DailyStock(DailyStockError::BackfillInProgress(_)))
        ));

        assert!(full_run.await.unwrap().is_ok());

        // With the slot released, a standalone step runs again.
        assert!(service.run_step(target, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_step_chaining_uses_returned_cursor() {
        let target = date(2026, 2, 20);
        let store = Arc::new(MockStore::new());

        let count = (BACKFILL_PAGE_SIZE + 1) as usize;
        let symbols: Vec<String> = (0..count).map(|i| format!("SYM{:04}", i)).collect();
        seed_flagged(&store, target, &symbols).await;

        let service = BackfillService::new(store.clone());

        let first = service.run_step(target, None).await.unwrap();
        assert!(!first.done);
        let cursor = first.cursor.clone().unwrap();

        let second = service.run_step(target, Some(&cursor)).await.unwrap();
        assert_eq!(second.scanned, 1);
        assert!(second.done);
        assert_eq!(store.scan_calls(), 2);
    }
}
