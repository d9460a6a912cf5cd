// src/remote/stub.rs
//! Scripted source for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::HeadlineSource;
use crate::article::{HeadlinesResponse, RemoteArticle};
use crate::error::FetchError;

/// Returns queued results in order; once the queue is drained the last
/// result keeps repeating. Counts every call.
#[derive(Debug, Default)]
pub struct StubSource {
    script: Mutex<VecDeque<Result<HeadlinesResponse, FetchError>>>,
    last: Mutex<Option<Result<HeadlinesResponse, FetchError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(articles: Vec<RemoteArticle>) -> Self {
        let s = Self::new();
        s.push_ok(articles);
        s
    }

    pub fn failing(err: FetchError) -> Self {
        let s = Self::new();
        s.push(Err(err));
        s
    }

    pub fn push(&self, result: Result<HeadlinesResponse, FetchError>) {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(result);
    }

    pub fn push_ok(&self, articles: Vec<RemoteArticle>) {
        self.push(Ok(HeadlinesResponse {
            status: "ok".into(),
            total_results: articles.len() as u32,
            articles,
        }));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(source_id, api_key)` of every call, in order.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl HeadlineSource for StubSource {
    async fn top_headlines(
        &self,
        source_id: &str,
        api_key: &str,
    ) -> Result<HeadlinesResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((source_id.to_string(), api_key.to_string()));

        let next = self
            .script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        match next {
            Some(r) => {
                *last = Some(r.clone());
                r
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(FetchError::Unexpected("stub source has no script".into()))),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
