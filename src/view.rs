// src/view.rs
//! Presentation-facing state: what a list/detail screen would render,
//! folded from the sync states as they arrive.

use std::sync::{Arc, RwLock};

use futures::StreamExt;
use serde::Serialize;

use crate::article::Article;
use crate::config::SyncConfig;
use crate::sync::{HeadlineSync, SyncState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeadlinesView {
    pub articles: Vec<Article>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub source_name: String,
    pub selected: Option<Article>,
}

impl HeadlinesView {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            ..Self::default()
        }
    }

    /// Fold one sync state. Snapshot-less states keep what is on screen.
    pub fn apply(&mut self, state: &SyncState) {
        match state {
            SyncState::Loading { snapshot } => {
                if let Some(s) = snapshot {
                    self.articles = s.clone();
                }
                self.is_loading = true;
                self.error = None;
            }
            SyncState::Success { data } => {
                self.articles = data.clone();
                self.is_loading = false;
                self.error = None;
            }
            SyncState::Failure { reason, snapshot } => {
                if let Some(s) = snapshot {
                    self.articles = s.clone();
                }
                self.is_loading = false;
                self.error = Some(reason.clone());
            }
        }
    }

    /// Record the article with `url` as the detail selection.
    pub fn select(&mut self, url: &str) -> Option<&Article> {
        let found = self.articles.iter().find(|a| a.url == url)?.clone();
        self.selected = Some(found);
        self.selected.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

/// A configured sync plus the view it feeds.
pub struct HeadlinesFeed {
    sync: HeadlineSync,
    config: SyncConfig,
    view: Arc<RwLock<HeadlinesView>>,
}

impl HeadlinesFeed {
    pub fn new(sync: HeadlineSync, config: SyncConfig) -> Self {
        let view = HeadlinesView::new(config.source_name.clone());
        Self {
            sync,
            config,
            view: Arc::new(RwLock::new(view)),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn sync(&self) -> &HeadlineSync {
        &self.sync
    }

    /// Run one sync for the configured source, applying each state to the
    /// view as it arrives. Returns the view after the terminal state.
    pub async fn load(&self, force: bool) -> HeadlinesView {
        let mut states = self
            .sync
            .sync(&self.config.source_id, &self.config.api_key, force);
        while let Some(state) = states.next().await {
            self.update(|v| v.apply(&state));
        }
        self.view()
    }

    pub fn view(&self) -> HeadlinesView {
        match self.view.read() {
            Ok(g) => g.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    pub fn select(&self, url: &str) -> Option<Article> {
        self.update(|v| v.select(url).cloned())
    }

    pub fn clear_error(&self) -> HeadlinesView {
        self.update(|v| {
            v.clear_error();
            v.clone()
        })
    }

    fn update<T>(&self, f: impl FnOnce(&mut HeadlinesView) -> T) -> T {
        let mut g = self.view.write().unwrap_or_else(|p| p.into_inner());
        f(&mut g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn article(url: &str) -> Article {
        Article {
            source_id: None,
            source_name: "BBC News".into(),
            author: None,
            title: url.into(),
            description: None,
            url: url.into(),
            image_url: None,
            published_at: DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z").unwrap(),
            content: None,
        }
    }

    #[test]
    fn failure_without_snapshot_keeps_articles() {
        let mut v = HeadlinesView::new("BBC News");
        v.apply(&SyncState::Success {
            data: vec![article("a")],
        });
        v.apply(&SyncState::Loading { snapshot: None });
        assert!(v.is_loading);
        v.apply(&SyncState::Failure {
            reason: "No internet connection. Showing cached data.".into(),
            snapshot: None,
        });
        assert_eq!(v.articles.len(), 1);
        assert!(!v.is_loading);
        assert!(v.error.is_some());
        v.clear_error();
        assert!(v.error.is_none());
    }

    #[test]
    fn select_by_url() {
        let mut v = HeadlinesView::new("BBC News");
        v.apply(&SyncState::Loading {
            snapshot: Some(vec![article("a"), article("b")]),
        });
        assert_eq!(v.select("b").map(|a| a.url.clone()), Some("b".to_string()));
        assert!(v.select("zzz").is_none());
        assert_eq!(v.selected.as_ref().map(|a| a.url.as_str()), Some("b"));
    }
}
