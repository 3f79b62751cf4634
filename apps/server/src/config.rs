//! Server configuration loaded from the environment.

use anyhow::Context;

/// Runtime configuration for the server binary.
///
/// All values come from environment variables (a `.env` file is honored via
/// dotenvy). `MASSIVE_API_KEY` is the only required setting; everything else
/// has a sensible default.
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Socket address the HTTP server binds to.
    pub listen_addr: String,
    /// API key for the Massive grouped-daily endpoint.
    pub massive_api_key: String,
    /// Override for the Massive API base URL, mainly for tests.
    pub massive_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let massive_api_key = std::env::var("MASSIVE_API_KEY")
            .context("MASSIVE_API_KEY must be set to fetch market data")?;

        Ok(Self {
            db_path: std::env::var("GAPFILL_DB_PATH")
                .unwrap_or_else(|_| "data/gapfill.db".to_string()),
            listen_addr: std::env::var("GAPFILL_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            massive_api_key,
            massive_base_url: std::env::var("MASSIVE_BASE_URL").ok(),
        })
    }
}
