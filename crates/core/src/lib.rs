//! Core domain crate for the gapfill pipeline.
//!
//! Ingests one OHLCV summary per symbol per trading day, computes the derived
//! per-record metrics (`range`, `change`, `gap`), and reconciles records whose
//! gap could not be computed at ingestion time because the previous day's
//! close was not yet stored.
//!
//! This crate is database-agnostic: persistence is reached only through the
//! [`daily_stocks::DailyStockStore`] trait, implemented by the
//! `gapfill-storage-sqlite` crate.

pub mod daily_stocks;
pub mod errors;
pub mod market_data;

pub use errors::{DatabaseError, Error, Result, ValidationError};
