// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod article;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod freshness;
pub mod gate;
pub mod metrics;
pub mod remote;
pub mod store;
pub mod sync;
pub mod view;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::article::{Article, ArticleRecord, CachedArticle};
pub use crate::cache::CacheGateway;
pub use crate::config::SyncConfig;
pub use crate::error::{FetchError, StoreError, SyncError};
pub use crate::freshness::FreshnessPolicy;
pub use crate::sync::{HeadlineSync, SyncState};
pub use crate::view::{HeadlinesFeed, HeadlinesView};

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::info;

use crate::clock::SystemClock;
use crate::gate::TokenGate;
use crate::remote::{HeadlineSource, NewsApiClient};
use crate::store::{ArticleStore, JsonFileStore};

/// Wire a feed from explicit parts. Used by `app()` and by tests that
/// swap in a memory store or a stub source.
pub fn build_feed(
    config: SyncConfig,
    store: Arc<dyn ArticleStore>,
    source: Arc<dyn HeadlineSource>,
) -> HeadlinesFeed {
    let cache = CacheGateway::new(store, Arc::new(SystemClock));
    let sync = HeadlineSync::new(cache, source)
        .with_policy(FreshnessPolicy::new(config.cache_duration()))
        .with_retention(config.retention());
    HeadlinesFeed::new(sync, config)
}

/// Build a configured feed backed by the JSON file store and NewsAPI.
pub fn feed_from_env() -> anyhow::Result<HeadlinesFeed> {
    let config = SyncConfig::load_default()?;
    if config.api_key.is_empty() {
        tracing::warn!("no api key configured; remote fetches will be rejected");
    }
    let store = JsonFileStore::open_default().context("opening headline store")?;
    info!(
        "headlines cfg loaded: source={}, store={}, key_len={}",
        config.source_id,
        store.path().display(),
        config.api_key.len()
    );
    let source = NewsApiClient::new(
        &config.base_url,
        config.connect_timeout(),
        config.request_timeout(),
    )?;
    Ok(build_feed(config, Arc::new(store), Arc::new(source)))
}

/// Router for the configured app (without `/metrics`; the binary adds it).
pub async fn app() -> anyhow::Result<Router> {
    let feed = feed_from_env()?;
    let gate = TokenGate::new(feed.config().access_token.as_deref());
    let state = AppState {
        feed: Arc::new(feed),
        gate: Arc::new(gate),
    };
    Ok(create_router(state))
}
