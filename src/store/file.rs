// src/store/file.rs
//! JSON snapshot store. Every mutation rewrites the file through a temp
//! file + rename so a crash never leaves a half-written snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{ArticleStore, Rows};
use crate::article::CachedArticle;
use crate::error::StoreError;

pub const DEFAULT_STORE_PATH: &str = "cache/headlines.json";
pub const ENV_STORE_PATH: &str = "HEADLINES_STORE_PATH";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    rows: Mutex<Rows>,
}

impl JsonFileStore {
    /// Open (or create on first write) the snapshot at `path`. A missing
    /// file is an empty store; an unreadable one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Rows::default(),
            Ok(s) => Rows::from_vec(serde_json::from_str::<Vec<CachedArticle>>(&s)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Rows::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(target: "store", path = %path.display(), rows = rows.as_slice().len(), "json store opened");
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    /// `$HEADLINES_STORE_PATH`, else `cache/headlines.json`.
    pub fn open_default() -> Result<Self, StoreError> {
        let p = std::env::var(ENV_STORE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));
        Self::open(p)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&mut Rows) -> T + Send,
    {
        // Held across the write so snapshots land in mutation order.
        let mut g = self.rows.lock().await;
        // Write a copy first; only commit in memory once the file is on disk.
        let mut next = g.clone();
        let out = f(&mut next);
        write_snapshot(&self.path, next.as_slice()).await?;
        *g = next;
        Ok(out)
    }
}

async fn write_snapshot(path: &Path, rows: &[CachedArticle]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(dir).await?;
        }
    }
    let json = serde_json::to_vec(rows)?;
    let tmp = path.with_extension("json.tmp");
    let mut f = tokio::fs::File::create(&tmp).await?;
    f.write_all(&json).await?;
    f.sync_all().await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ArticleStore for JsonFileStore {
    async fn query_partition(&self, key: &str) -> Result<Vec<CachedArticle>, StoreError> {
        Ok(self.rows.lock().await.partition(key))
    }

    async fn insert_replace(&self, rows: Vec<CachedArticle>) -> Result<(), StoreError> {
        self.mutate(|r| r.upsert(rows)).await
    }

    async fn delete_partition(&self, key: &str) -> Result<usize, StoreError> {
        self.mutate(|r| r.remove_partition(key)).await
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.mutate(|r| r.remove_older_than(cutoff)).await
    }
}
