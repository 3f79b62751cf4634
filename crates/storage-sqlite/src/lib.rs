//! SQLite storage implementation for the gapfill pipeline.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the `DailyStockStore` trait defined in
//! `gapfill-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The daily stock repository, including the index-backed paginated
//!   needs-backfill scan
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. All other crates are database-agnostic and work with traits.

pub mod daily_stocks;
pub mod db;
pub mod errors;
pub mod schema;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, DbConnection, DbPool};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from gapfill-core for convenience
pub use gapfill_core::errors::{DatabaseError, Error, Result};
