//! Sadhana Tracker: binary entrypoint.
//! Boots the Axum HTTP server on Shuttle, wiring config, store, and routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Structured logs: compact by default, JSON with LOG_FORMAT=json.
/// Filter from RUST_LOG, else `sadhana_tracker=info,warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sadhana_tracker=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    // The Shuttle runtime may already have installed a subscriber; keep it then.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let router = sadhana_tracker::app().await?;
    tracing::info!("sadhana tracker ready");

    Ok(router.into())
}
