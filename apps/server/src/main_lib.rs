use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use gapfill_core::daily_stocks::{BackfillService, DailyStockStore, IngestionService};
use gapfill_core::market_data::{DailyBarProvider, MassiveConfig, MassiveProvider};
use gapfill_storage_sqlite::daily_stocks::DailyStockRepository;
use gapfill_storage_sqlite::db;

pub struct AppState {
    pub ingestion_service: Arc<IngestionService>,
    pub backfill_service: Arc<BackfillService>,
    pub store: Arc<dyn DailyStockStore>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("GAPFILL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let pool = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let repository = Arc::new(DailyStockRepository::new(Arc::new(pool)));
    let store: Arc<dyn DailyStockStore> = repository;

    let mut provider_config = MassiveConfig::new(config.massive_api_key.clone());
    if let Some(base_url) = &config.massive_base_url {
        provider_config = provider_config.with_base_url(base_url.clone());
    }
    let provider: Arc<dyn DailyBarProvider> = Arc::new(MassiveProvider::new(provider_config));

    let ingestion_service = Arc::new(IngestionService::new(store.clone(), provider));
    let backfill_service = Arc::new(BackfillService::new(store.clone()));

    Ok(Arc::new(AppState {
        ingestion_service,
        backfill_service,
        store,
        db_path: config.db_path.clone(),
    }))
}
