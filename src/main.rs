//! Headline sync service: binary entrypoint.
//! Boots the Axum HTTP server with the configured feed, the access gate
//! and the Prometheus `/metrics` route.

use headline_sync::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; JSON lines when HEADLINES_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_sync=info,warn"));
    let json = std::env::var("HEADLINES_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    // The runtime may already have installed a subscriber.
    let _ = res;
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Recorder first so metric descriptions land on it.
    let metrics = Metrics::init().map_err(shuttle_runtime::Error::Custom)?;
    let router = headline_sync::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?
        .merge(metrics.router());

    Ok(router.into())
}
