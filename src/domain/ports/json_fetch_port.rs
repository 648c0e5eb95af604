//! Port for fetching remote JSON documents.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::FetchError;

/// Port for HTTP GET requests returning JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JsonFetchPort: Send + Sync {
    /// Fetches and parses the JSON document at `url`.
    ///
    /// Non-success statuses and unparsable bodies are errors.
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}
