//! Market data providers.
//!
//! Defines the [`DailyBarProvider`] trait consumed by the ingestion writer and
//! the Massive grouped-daily HTTP implementation.

pub(crate) mod errors;
pub(crate) mod massive_provider;
pub(crate) mod provider;

pub use errors::MarketDataError;
pub use massive_provider::{MassiveConfig, MassiveProvider};
pub use provider::{DailyBarProvider, RawDailyBar};
