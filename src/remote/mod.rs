// src/remote/mod.rs
pub mod newsapi;
pub mod stub;

pub use newsapi::NewsApiClient;
pub use stub::StubSource;

use async_trait::async_trait;

use crate::article::HeadlinesResponse;
use crate::error::FetchError;

/// Remote top-headlines capability.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn top_headlines(
        &self,
        source_id: &str,
        api_key: &str,
    ) -> Result<HeadlinesResponse, FetchError>;

    fn name(&self) -> &'static str;
}
