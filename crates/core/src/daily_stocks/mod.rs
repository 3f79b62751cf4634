//! Daily stock ingestion and backfill.
//!
//! - [`model`] - Domain records and the backfill page type
//! - [`metrics`] - Pure derived-metrics computer (`range`, `change`, `gap`)
//! - [`store`] - Storage trait implemented by the SQLite crate
//! - [`ingest`] - Ingestion writer (provider → metrics → batched upserts)
//! - [`backfill`] - Paginated scanner, per-record resolver, and the
//!   cursor-driven orchestrator
//!
//! Data flows provider → [`ingest::IngestionService`] → store; later, once
//! more days are ingested, [`backfill::BackfillService`] sweeps the records
//! still flagged `needs_backfill` for a date and fills their `gap`.

pub(crate) mod backfill;
pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod ingest;
pub(crate) mod metrics;
pub(crate) mod model;
pub(crate) mod store;

#[cfg(test)]
mod service_tests;

pub use backfill::{BackfillService, BackfillStep, BackfillSummary};
pub use constants::{BACKFILL_PAGE_SIZE, INGEST_CHUNK_SIZE, ZERO_DIVISOR_FALLBACK};
pub use errors::DailyStockError;
pub use ingest::{IngestSummary, IngestionService};
pub use metrics::{compute_record, pct_ratio};
pub use model::{previous_calendar_day, BackfillPage, DailyStockRecord};
pub use store::DailyStockStore;
