// src/store/memory.rs
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ArticleStore, Rows};
use crate::article::CachedArticle;
use crate::error::StoreError;

/// Process-local store. Used by tests and as a fallback when no file path
/// is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Rows>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing rows (same upsert rules as `insert_replace`).
    pub fn with_rows(rows: Vec<CachedArticle>) -> Self {
        Self {
            inner: RwLock::new(Rows::from_vec(rows)),
        }
    }

    /// Every row, any partition, in insertion order.
    pub fn snapshot(&self) -> Vec<CachedArticle> {
        match self.inner.read() {
            Ok(g) => g.as_slice().to_vec(),
            Err(p) => p.into_inner().as_slice().to_vec(),
        }
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn query_partition(&self, key: &str) -> Result<Vec<CachedArticle>, StoreError> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.partition(key))
    }

    async fn insert_replace(&self, rows: Vec<CachedArticle>) -> Result<(), StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        g.upsert(rows);
        Ok(())
    }

    async fn delete_partition(&self, key: &str) -> Result<usize, StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(g.remove_partition(key))
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(g.remove_older_than(cutoff))
    }
}
