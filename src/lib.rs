// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod profile;
pub mod scoring;
pub mod stats;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::entry::{Attendance, DailyEntry, EntryRecord, RawEntry, TimeOfDay};
pub use crate::normalize::normalize_entry;
pub use crate::scoring::{compute_scores, ScoreBundle};

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::config::AppConfig;
use crate::store::{DocumentStore, FileStore, MemoryStore};

/// Build the full in-process app from env/config: store, optional `/metrics`, routes.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::load()?;
    app_with_config(cfg).await
}

pub async fn app_with_config(cfg: AppConfig) -> anyhow::Result<Router> {
    let store: Arc<dyn DocumentStore> = match &cfg.store_path {
        Some(p) => Arc::new(FileStore::open(p.clone()).await?),
        None => {
            info!("no store path configured, keeping entries in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let metrics = if cfg.metrics_enabled {
        Some(metrics::Metrics::init()?)
    } else {
        None
    };

    let mut router = create_router(AppState::new(store, cfg));
    if let Some(m) = metrics {
        router = router.merge(m.router());
    }
    Ok(router)
}
