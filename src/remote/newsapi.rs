// src/remote/newsapi.rs
//! NewsAPI `v2/top-headlines` client.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use metrics::histogram;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::HeadlineSource;
use crate::article::HeadlinesResponse;
use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org/";
const TOP_HEADLINES_PATH: &str = "v2/top-headlines";

pub struct NewsApiClient {
    http: Client,
    endpoint: Url,
}

/// Error envelope NewsAPI returns alongside non-"ok" statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NewsApiClient {
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("parsing base url {base_url}"))?;
        let endpoint = base
            .join(TOP_HEADLINES_PATH)
            .context("building top-headlines endpoint")?;
        let http = Client::builder()
            .user_agent(concat!("headline-sync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Sort a transport error into the user-facing categories. The URL is
/// stripped first because it carries the api key.
fn classify(e: reqwest::Error) -> FetchError {
    let e = e.without_url();
    if e.is_timeout() || e.is_connect() || e.is_body() || e.is_request() {
        FetchError::Connectivity(e.to_string())
    } else if let Some(status) = e.status() {
        FetchError::Protocol {
            status: Some(status.as_u16()),
            reason: status_text(status),
        }
    } else {
        FetchError::Unexpected(e.to_string())
    }
}

fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(r) => format!("HTTP {} {}", status.as_u16(), r),
        None => format!("HTTP {}", status.as_u16()),
    }
}

fn describe_api_error(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.code, parsed.message) {
        (Some(c), Some(m)) => Some(format!("{c}: {m}")),
        (None, Some(m)) => Some(m),
        (Some(c), None) => Some(c),
        (None, None) => None,
    }
}

#[async_trait]
impl HeadlineSource for NewsApiClient {
    async fn top_headlines(
        &self,
        source_id: &str,
        api_key: &str,
    ) -> Result<HeadlinesResponse, FetchError> {
        let t0 = Instant::now();
        let resp = self
            .http
            .get(self.endpoint.clone())
            .query(&[("sources", source_id), ("apiKey", api_key)])
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        let body = resp.text().await.map_err(classify)?;
        histogram!("headlines_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !status.is_success() {
            let mut reason = status_text(status);
            if let Some(detail) = describe_api_error(&body) {
                reason = format!("{reason} ({detail})");
            }
            tracing::warn!(target: "remote", source = source_id, status = status.as_u16(), "top-headlines http error");
            return Err(FetchError::Protocol {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let parsed: HeadlinesResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::Unexpected(format!("decoding top-headlines: {e}")))?;

        if !parsed.status.eq_ignore_ascii_case("ok") {
            let reason = describe_api_error(&body)
                .unwrap_or_else(|| format!("status `{}`", parsed.status));
            return Err(FetchError::Protocol {
                status: Some(status.as_u16()),
                reason,
            });
        }

        tracing::debug!(
            target: "remote",
            source = source_id,
            total = parsed.total_results,
            returned = parsed.articles.len(),
            "top-headlines fetched"
        );
        Ok(parsed)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
