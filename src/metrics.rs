use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn describe_all() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "headlines_sync_total",
            "Sync runs by outcome (cache, fetched, failed)."
        );
        describe_counter!(
            "headlines_cache_hits_total",
            "Syncs answered from a fresh cache without a network call."
        );
        describe_counter!(
            "headlines_fetch_errors_total",
            "Failed syncs by kind (connectivity, protocol, unexpected, storage)."
        );
        describe_counter!(
            "headlines_mapping_errors_total",
            "Articles skipped because publishedAt did not parse."
        );
        describe_histogram!("headlines_fetch_ms", "Remote fetch time in milliseconds.");
        describe_gauge!(
            "headlines_last_fetch_ts",
            "Unix ts of the last successful remote fetch."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already set.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_all();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
