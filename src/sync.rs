// src/sync.rs
//! Headline synchronizer: cache-aside read-through with staleness-based
//! refresh and stale-while-revalidate fallback.
//!
//! One `sync` call yields at most three states:
//! `Loading(None)`, optionally `Loading(Some(cache))`, then exactly one
//! terminal `Success` or `Failure`. Dropping the stream before the terminal
//! state abandons the in-flight fetch; the cache is only written after the
//! fetch has fully succeeded.

use std::sync::Arc;

use chrono::Duration;
use futures::stream::{self, BoxStream, StreamExt};
use metrics::{counter, gauge};
use serde::Serialize;

use crate::article::{
    map_articles, parse_published, sort_newest_first, Article, ArticleRecord, CachedArticle,
};
use crate::cache::CacheGateway;
use crate::error::{StoreError, SyncError};
use crate::freshness::FreshnessPolicy;
use crate::remote::HeadlineSource;

pub const DEFAULT_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    Loading {
        snapshot: Option<Vec<Article>>,
    },
    Success {
        data: Vec<Article>,
    },
    Failure {
        reason: String,
        snapshot: Option<Vec<Article>>,
    },
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncState::Loading { .. })
    }

    /// Articles carried by this state, if any.
    pub fn articles(&self) -> Option<&[Article]> {
        match self {
            SyncState::Loading { snapshot } | SyncState::Failure { snapshot, .. } => {
                snapshot.as_deref()
            }
            SyncState::Success { data } => Some(data),
        }
    }
}

#[derive(Clone)]
pub struct HeadlineSync {
    cache: CacheGateway,
    source: Arc<dyn HeadlineSource>,
    policy: FreshnessPolicy,
    retention: Duration,
}

enum Step {
    Start,
    Decide,
    Fetch(Vec<CachedArticle>),
    Done,
}

struct Run {
    sync: HeadlineSync,
    partition: String,
    credential: String,
    force: bool,
}

impl HeadlineSync {
    pub fn new(cache: CacheGateway, source: Arc<dyn HeadlineSource>) -> Self {
        crate::metrics::describe_all();
        Self {
            cache,
            source,
            policy: FreshnessPolicy::default(),
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    pub fn with_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn cache(&self) -> &CacheGateway {
        &self.cache
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    /// Start one sync for `partition`. States are produced lazily as the
    /// stream is polled.
    pub fn sync(
        &self,
        partition: &str,
        credential: &str,
        force: bool,
    ) -> BoxStream<'static, SyncState> {
        let run = Run {
            sync: self.clone(),
            partition: partition.to_string(),
            credential: credential.to_string(),
            force,
        };
        stream::unfold((run, Step::Start), |(run, step)| async move {
            let (state, next) = match step {
                Step::Start => (SyncState::Loading { snapshot: None }, Step::Decide),
                Step::Decide => run.decide().await,
                Step::Fetch(cached) => (run.fetch(&cached).await, Step::Done),
                Step::Done => return None,
            };
            Some((state, (run, next)))
        })
        .boxed()
    }

    /// Drive a sync to its terminal state and return every state emitted.
    pub async fn sync_all(&self, partition: &str, credential: &str, force: bool) -> Vec<SyncState> {
        self.sync(partition, credential, force).collect().await
    }
}

impl Run {
    async fn decide(&self) -> (SyncState, Step) {
        let cache = &self.sync.cache;
        let cached = match cache.read_partition(&self.partition).await {
            Ok(rows) => rows,
            Err(e) => return (self.fail(SyncError::Storage(e), None), Step::Done),
        };

        let now = cache.now();
        if !self.sync.policy.should_fetch(&cached, self.force, now) {
            counter!("headlines_cache_hits_total").increment(1);
            counter!("headlines_sync_total", "outcome" => "cache").increment(1);
            tracing::debug!(target: "sync", partition = %self.partition, count = cached.len(), "serving fresh cache");
            return (
                SyncState::Success {
                    data: map_articles(&cached),
                },
                Step::Done,
            );
        }

        // Rows that all fail mapping give nothing new to show.
        match snapshot_of(&cached) {
            Some(snapshot) => (
                SyncState::Loading {
                    snapshot: Some(snapshot),
                },
                Step::Fetch(cached),
            ),
            None => (self.fetch(&cached).await, Step::Done),
        }
    }

    async fn fetch(&self, cached: &[CachedArticle]) -> SyncState {
        let remote = self.sync.source.name();
        tracing::info!(target: "sync", remote, partition = %self.partition, force = self.force, cached = cached.len(), "fetching headlines");

        let resp = match self
            .sync
            .source
            .top_headlines(&self.partition, &self.credential)
            .await
        {
            Ok(r) => r,
            Err(e) => return self.fail(SyncError::Fetch(e), snapshot_of(cached)),
        };

        // Drop unmappable records before ordering so only valid instants
        // reach the sort.
        let mut kept = Vec::with_capacity(resp.articles.len());
        for rec in resp.articles.into_iter().map(ArticleRecord::from) {
            match parse_published(&rec.published_at) {
                Ok(_) => kept.push(rec),
                Err(e) => {
                    tracing::warn!(target: "sync", remote, partition = %self.partition, url = %rec.url, error = %e, "dropping fetched article");
                    counter!("headlines_mapping_errors_total").increment(1);
                }
            }
        }
        sort_newest_first(&mut kept);
        let articles = map_articles(&kept);

        if let Err(e) = self.persist(kept).await {
            let snapshot = self
                .sync
                .cache
                .read_partition(&self.partition)
                .await
                .ok()
                .and_then(|rows| snapshot_of(&rows));
            return self.fail(SyncError::Storage(e), snapshot);
        }

        counter!("headlines_sync_total", "outcome" => "fetched").increment(1);
        gauge!("headlines_last_fetch_ts").set(self.sync.cache.now().timestamp() as f64);
        tracing::info!(target: "sync", remote, partition = %self.partition, count = articles.len(), "headlines refreshed");
        SyncState::Success { data: articles }
    }

    async fn persist(&self, records: Vec<ArticleRecord>) -> Result<(), StoreError> {
        let cache = &self.sync.cache;
        cache.replace_partition(&self.partition, records).await?;
        let cutoff = cache.now() - self.sync.retention;
        cache.prune_older_than(cutoff).await?;
        Ok(())
    }

    fn fail(&self, err: SyncError, snapshot: Option<Vec<Article>>) -> SyncState {
        counter!("headlines_sync_total", "outcome" => "failed").increment(1);
        counter!("headlines_fetch_errors_total", "kind" => err.kind()).increment(1);
        tracing::warn!(
            target: "sync",
            remote = self.sync.source.name(),
            partition = %self.partition,
            kind = err.kind(),
            error = %err,
            has_snapshot = snapshot.is_some(),
            "sync failed"
        );
        SyncState::Failure {
            reason: err.user_message(),
            snapshot,
        }
    }
}

fn snapshot_of(rows: &[CachedArticle]) -> Option<Vec<Article>> {
    let mapped = map_articles(rows);
    if mapped.is_empty() {
        None
    } else {
        Some(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loading_is_non_terminal() {
        assert!(!SyncState::Loading { snapshot: None }.is_terminal());
        assert!(SyncState::Success { data: vec![] }.is_terminal());
        assert!(SyncState::Failure {
            reason: "x".into(),
            snapshot: None
        }
        .is_terminal());
    }

    #[test]
    fn serializes_with_state_tag() {
        let v = serde_json::to_value(SyncState::Loading { snapshot: None }).unwrap();
        assert_eq!(v["state"], "loading");
    }
}
