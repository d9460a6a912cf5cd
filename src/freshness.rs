// src/freshness.rs
//! Freshness policy: decides whether a sync must go to the network.

use chrono::{DateTime, Duration, Utc};

use crate::article::CachedArticle;

pub const DEFAULT_CACHE_DURATION_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub cache_duration: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            cache_duration: Duration::seconds(DEFAULT_CACHE_DURATION_SECS),
        }
    }
}

impl FreshnessPolicy {
    pub fn new(cache_duration: Duration) -> Self {
        Self { cache_duration }
    }

    /// Rules, in order: forced → fetch; empty → fetch; first row older than
    /// the window → fetch; otherwise serve the cache.
    ///
    /// `cached` is expected in partition read order (newest `published_at`
    /// first), so the first row is not necessarily the latest cached one.
    pub fn should_fetch(&self, cached: &[CachedArticle], force: bool, now: DateTime<Utc>) -> bool {
        if force {
            return true;
        }
        match cached.first() {
            None => true,
            Some(first) => now - first.cached_at > self.cache_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::ArticleRecord;
    use chrono::TimeZone;

    fn row(cached_at: DateTime<Utc>) -> CachedArticle {
        CachedArticle {
            record: ArticleRecord {
                source_id: None,
                source_name: "BBC News".into(),
                author: None,
                title: "t".into(),
                description: None,
                url: "https://x.test/1".into(),
                image_url: None,
                published_at: "2024-01-01T12:00:00Z".into(),
                content: None,
            },
            partition_key: "bbc-news".into(),
            cached_at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn force_always_fetches() {
        let p = FreshnessPolicy::default();
        assert!(p.should_fetch(&[row(now())], true, now()));
        assert!(p.should_fetch(&[], true, now()));
    }

    #[test]
    fn empty_cache_fetches() {
        assert!(FreshnessPolicy::default().should_fetch(&[], false, now()));
    }

    #[test]
    fn boundary_is_strictly_greater_than_window() {
        let p = FreshnessPolicy::default();
        let hour = Duration::hours(1);
        let ms = Duration::milliseconds(1);

        assert!(p.should_fetch(&[row(now() - hour - ms)], false, now()));
        assert!(!p.should_fetch(&[row(now() - hour + ms)], false, now()));
        assert!(!p.should_fetch(&[row(now() - hour)], false, now()));
    }

    #[test]
    fn only_first_row_is_consulted() {
        let p = FreshnessPolicy::default();
        let stale_first = vec![row(now() - Duration::hours(2)), row(now())];
        assert!(p.should_fetch(&stale_first, false, now()));
    }
}
