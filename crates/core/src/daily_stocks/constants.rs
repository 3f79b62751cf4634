//! Tuning constants for ingestion and backfill.

/// Number of records written per upsert batch during ingestion.
///
/// Keeps the per-transaction working set constant regardless of how many
/// symbols traded on a given day. Behavior must be identical for any value;
/// batches carry no cross-batch state.
pub const INGEST_CHUNK_SIZE: usize = 100;

/// Maximum number of flagged records returned per backfill scan page.
pub const BACKFILL_PAGE_SIZE: i64 = 100;

/// Value used for `range` and `change` when their divisor is zero.
///
/// A `low` or `open` of zero is degenerate but possible input; dividing would
/// produce infinities, so every code path substitutes this constant instead.
pub const ZERO_DIVISOR_FALLBACK: f64 = 0.0;
