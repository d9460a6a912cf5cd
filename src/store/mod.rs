// src/store/mod.rs
pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::article::{published_desc_key, CachedArticle};
use crate::error::StoreError;

/// Keyed persistent store for cached headlines. `url` is the primary key
/// across every partition.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Rows of one partition, newest `published_at` first.
    async fn query_partition(&self, key: &str) -> Result<Vec<CachedArticle>, StoreError>;

    /// Insert rows; an existing row with the same `url` is replaced.
    async fn insert_replace(&self, rows: Vec<CachedArticle>) -> Result<(), StoreError>;

    /// Delete every row of one partition. Returns the number removed.
    async fn delete_partition(&self, key: &str) -> Result<usize, StoreError>;

    /// Delete every row, any partition, with `cached_at < cutoff`.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Row table shared by the store backends. Insertion order is kept so
/// that ties in the publish-date ordering are deterministic.
#[derive(Debug, Default, Clone)]
pub(crate) struct Rows {
    rows: Vec<CachedArticle>,
}

impl Rows {
    pub(crate) fn from_vec(rows: Vec<CachedArticle>) -> Self {
        let mut out = Self::default();
        out.upsert(rows);
        out
    }

    pub(crate) fn as_slice(&self) -> &[CachedArticle] {
        &self.rows
    }

    pub(crate) fn partition(&self, key: &str) -> Vec<CachedArticle> {
        let mut v: Vec<CachedArticle> = self
            .rows
            .iter()
            .filter(|r| r.partition_key == key)
            .cloned()
            .collect();
        v.sort_by_cached_key(|r| published_desc_key(r.published_at()));
        v
    }

    pub(crate) fn upsert(&mut self, incoming: Vec<CachedArticle>) {
        for row in incoming {
            self.rows.retain(|r| r.url() != row.url());
            self.rows.push(row);
        }
    }

    pub(crate) fn remove_partition(&mut self, key: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.partition_key != key);
        before - self.rows.len()
    }

    pub(crate) fn remove_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.cached_at >= cutoff);
        before - self.rows.len()
    }
}
