// src/article.rs
//! Headline data model: the remote wire shape, the cached row, and the
//! domain `Article` handed to the presentation layer.

use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::MappingError;

// ------------------------------------------------------------
// Remote (wire) shape
// ------------------------------------------------------------

/// Envelope returned by `v2/top-headlines`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub articles: Vec<RemoteArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSource {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteArticle {
    pub source: RemoteSource,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: String,
    pub content: Option<String>,
}

// ------------------------------------------------------------
// Cache rows
// ------------------------------------------------------------

/// Article fields as written to the cache, before the cache layer stamps
/// the partition and `cached_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub source_id: Option<String>,
    pub source_name: String,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    /// Raw ISO-8601 string as received.
    pub published_at: String,
    pub content: Option<String>,
}

impl From<RemoteArticle> for ArticleRecord {
    fn from(a: RemoteArticle) -> Self {
        Self {
            source_id: a.source.id,
            source_name: a.source.name,
            author: a.author,
            title: a.title,
            description: a.description,
            url: a.url,
            image_url: a.url_to_image,
            published_at: a.published_at,
            content: a.content,
        }
    }
}

/// Persisted row. `url` is the primary key across all partitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedArticle {
    #[serde(flatten)]
    pub record: ArticleRecord,
    pub partition_key: String,
    pub cached_at: DateTime<Utc>,
}

impl CachedArticle {
    pub fn url(&self) -> &str {
        &self.record.url
    }

    pub fn published_at(&self) -> &str {
        &self.record.published_at
    }
}

// ------------------------------------------------------------
// Domain
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub source_id: Option<String>,
    pub source_name: String,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<FixedOffset>,
    pub content: Option<String>,
}

/// Parse an ISO-8601 date-time with offset (`2024-01-01T12:00:00Z`).
pub fn parse_published(raw: &str) -> Result<DateTime<FixedOffset>, MappingError> {
    DateTime::parse_from_rfc3339(raw.trim()).map_err(|source| MappingError::Timestamp {
        value: raw.to_string(),
        source,
    })
}

impl TryFrom<&ArticleRecord> for Article {
    type Error = MappingError;

    fn try_from(r: &ArticleRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            source_id: r.source_id.clone(),
            source_name: r.source_name.clone(),
            author: r.author.clone(),
            title: r.title.clone(),
            description: r.description.clone(),
            url: r.url.clone(),
            image_url: r.image_url.clone(),
            published_at: parse_published(&r.published_at)?,
            content: r.content.clone(),
        })
    }
}

impl TryFrom<&CachedArticle> for Article {
    type Error = MappingError;

    fn try_from(c: &CachedArticle) -> Result<Self, Self::Error> {
        Article::try_from(&c.record)
    }
}

/// Map a batch record by record. A bad row is logged, counted and skipped;
/// the rest of the batch survives.
pub fn map_articles<'a, T>(rows: impl IntoIterator<Item = &'a T>) -> Vec<Article>
where
    T: 'a,
    for<'b> Article: TryFrom<&'b T, Error = MappingError>,
{
    let mut out = Vec::new();
    for row in rows {
        match Article::try_from(row) {
            Ok(a) => out.push(a),
            Err(e) => {
                tracing::warn!(target: "sync", error = %e, "skipping article with bad timestamp");
                counter!("headlines_mapping_errors_total").increment(1);
            }
        }
    }
    out
}

/// Sort key for newest-first ordering. Instants are compared across
/// offsets; a value that does not parse sorts after every valid one.
pub fn published_desc_key(raw: &str) -> Reverse<Option<DateTime<FixedOffset>>> {
    Reverse(parse_published(raw).ok())
}

/// Stable sort, newest first; ties keep response order.
pub fn sort_newest_first(records: &mut [ArticleRecord]) {
    records.sort_by_cached_key(|r| published_desc_key(&r.published_at));
}
