//! Time-bounded catalog cache over the durable key-value store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::entities::{CachedCatalog, CatalogEntry};
use crate::domain::errors::FetchError;
use crate::domain::ports::{JsonFetchPort, KeyValueStorePort};

/// Fetches the avatar catalog, reusing a stored copy while it is fresh.
pub struct CatalogCache {
    fetcher: Arc<dyn JsonFetchPort>,
    store: Arc<dyn KeyValueStorePort>,
    cache_key: String,
    max_age: Duration,
}

impl CatalogCache {
    /// Creates a cache storing the catalog under `cache_key`.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn JsonFetchPort>,
        store: Arc<dyn KeyValueStorePort>,
        cache_key: impl Into<String>,
        max_age: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            cache_key: cache_key.into(),
            max_age,
        }
    }

    /// Store key of the cached catalog.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Returns the catalog published at `source_url`.
    ///
    /// Never fails: fetch errors are logged and yield an empty catalog.
    pub async fn load(&self, source_url: &str) -> Vec<CatalogEntry> {
        self.load_at(source_url, Utc::now()).await
    }

    /// Same as [`Self::load`] with an explicit clock.
    pub async fn load_at(&self, source_url: &str, now: DateTime<Utc>) -> Vec<CatalogEntry> {
        if let Some(cached) = self.read_cached().await {
            if cached.is_valid_for(source_url, now, self.max_age) {
                debug!(
                    src = %source_url,
                    entries = cached.data.len(),
                    age_minutes = (now - cached.timestamp).num_minutes(),
                    "Using cached catalog"
                );
                return cached.data;
            }
            debug!(src = %source_url, cached_src = %cached.src, "Cached catalog is stale");
        }

        let entries = match self.fetch_catalog(source_url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to load catalog");
                return Vec::new();
            }
        };

        info!(src = %source_url, entries = entries.len(), "Fetched catalog");
        self.write_cached(&CachedCatalog::new(source_url, now, entries.clone()))
            .await;
        entries
    }

    /// Drops the stored catalog so the next load fetches.
    pub async fn invalidate(&self) {
        if let Err(e) = self.store.remove(&self.cache_key).await {
            warn!(key = %self.cache_key, error = %e, "Failed to invalidate catalog cache");
        } else {
            debug!(key = %self.cache_key, "Catalog cache invalidated");
        }
    }

    /// Returns the category names published at `url`. Not cached.
    pub async fn load_categories(&self, url: &str) -> Vec<String> {
        match self.fetch_array(url).await {
            Ok(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) if !name.trim().is_empty() => Some(name),
                    _ => None,
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load categories");
                Vec::new()
            }
        }
    }

    async fn fetch_catalog(&self, url: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        let items = self.fetch_array(url).await?;
        let total = items.len();
        let entries: Vec<CatalogEntry> = items.iter().filter_map(CatalogEntry::from_value).collect();

        if entries.len() < total {
            debug!(skipped = total - entries.len(), "Skipped catalog items without a URL");
        }
        Ok(entries)
    }

    async fn fetch_array(&self, url: &str) -> Result<Vec<Value>, FetchError> {
        match self.fetcher.fetch_json(url).await? {
            Value::Array(items) => Ok(items),
            _ => Err(FetchError::NotAnArray {
                url: url.to_string(),
            }),
        }
    }

    async fn read_cached(&self) -> Option<CachedCatalog> {
        let raw = match self.store.get(&self.cache_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %self.cache_key, error = %e, "Failed to read catalog cache");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(key = %self.cache_key, error = %e, "Ignoring corrupt catalog cache");
                None
            }
        }
    }

    async fn write_cached(&self, cached: &CachedCatalog) {
        let raw = match serde_json::to_string(cached) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize catalog cache");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.cache_key, &raw).await {
            warn!(key = %self.cache_key, error = %e, "Failed to write catalog cache");
        }
    }
}
