// src/cache.rs
//! Cache gateway: partition-scoped reads over an `ArticleStore`, full
//! partition replacement, and the global retention sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::article::{ArticleRecord, CachedArticle};
use crate::clock::Clock;
use crate::error::StoreError;
use crate::store::ArticleStore;

#[derive(Clone)]
pub struct CacheGateway {
    store: Arc<dyn ArticleStore>,
    clock: Arc<dyn Clock>,
    // Bumped after every mutation made through this gateway.
    changes: Arc<watch::Sender<u64>>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn ArticleStore>, clock: Arc<dyn Clock>) -> Self {
        let (tx, _rx) = watch::channel(0u64);
        Self {
            store,
            clock,
            changes: Arc::new(tx),
        }
    }

    /// Point-in-time read, newest `published_at` first.
    pub async fn read_partition(&self, key: &str) -> Result<Vec<CachedArticle>, StoreError> {
        self.store.query_partition(key).await
    }

    /// Live read: yields the current contents, then again after every
    /// replace/prune made through this gateway. Ends when the gateway and
    /// all its clones are dropped.
    pub fn subscribe(&self, key: &str) -> BoxStream<'static, Result<Vec<CachedArticle>, StoreError>> {
        let mut rx = self.changes.subscribe();
        rx.mark_changed();
        let store = self.store.clone();
        let key = key.to_string();
        stream::unfold((rx, store, key), |(mut rx, store, key)| async move {
            rx.changed().await.ok()?;
            let rows = store.query_partition(&key).await;
            Some((rows, (rx, store, key)))
        })
        .boxed()
    }

    /// Delete every row of `key`, then insert `records` stamped with the
    /// current time. A failure after the delete leaves the partition empty,
    /// which the next read treats as a cold cache.
    pub async fn replace_partition(
        &self,
        key: &str,
        records: Vec<ArticleRecord>,
    ) -> Result<(), StoreError> {
        let cached_at = self.clock.now();
        let rows: Vec<CachedArticle> = records
            .into_iter()
            .map(|record| CachedArticle {
                record,
                partition_key: key.to_string(),
                cached_at,
            })
            .collect();
        let count = rows.len();

        let removed = self.store.delete_partition(key).await;
        self.notify();
        let removed = removed?;
        let inserted = self.store.insert_replace(rows).await;
        self.notify();
        inserted?;

        tracing::debug!(target: "cache", partition = key, removed, inserted = count, "partition replaced");
        Ok(())
    }

    /// Delete every row, any partition, cached before `cutoff`.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.store.delete_older_than(cutoff).await?;
        if removed > 0 {
            self.notify();
            tracing::debug!(target: "cache", removed, cutoff = %cutoff, "retention sweep");
        }
        Ok(removed)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn notify(&self) {
        self.changes.send_modify(|g| *g = g.wrapping_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn rec(url: &str) -> ArticleRecord {
        ArticleRecord {
            source_id: None,
            source_name: "S".into(),
            author: None,
            title: url.into(),
            description: None,
            url: url.into(),
            image_url: None,
            published_at: "2024-01-01T12:00:00Z".into(),
            content: None,
        }
    }

    #[tokio::test]
    async fn replace_stamps_cached_at_from_clock() {
        let t = Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap();
        let gw = CacheGateway::new(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(t)));
        gw.replace_partition("p", vec![rec("a")]).await.unwrap();
        let rows = gw.read_partition("p").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cached_at, t);
        assert_eq!(rows[0].partition_key, "p");
    }

    #[tokio::test]
    async fn subscribe_yields_current_then_changes() {
        let t = Utc.with_ymd_and_hms(2024, 5, 5, 5, 5, 5).unwrap();
        let gw = CacheGateway::new(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(t)));
        let mut sub = gw.subscribe("p");

        let first = sub.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        gw.replace_partition("p", vec![rec("a"), rec("b")]).await.unwrap();
        // The watch channel coalesces, so the latest value is what we observe.
        let next = sub.next().await.unwrap().unwrap();
        assert_eq!(next.len(), 2);
    }
}
