//! Avatar catalog value objects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names accepted for the image URL, in lookup order.
const URL_FIELDS: [&str; 4] = ["url", "imageUrl", "link", "src"];

/// One selectable avatar image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    folder: Option<String>,
}

impl CatalogEntry {
    /// Creates an entry with only a URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            category: None,
            folder: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Builds an entry from one element of a remote catalog payload.
    ///
    /// Accepts a bare URL string or an object carrying the URL under
    /// `url`, `imageUrl`, `link` or `src`. Returns `None` when no
    /// non-empty URL can be found.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) if !url.trim().is_empty() => Some(Self::new(url.trim())),
            Value::Object(map) => {
                let url = URL_FIELDS
                    .iter()
                    .filter_map(|field| map.get(*field).and_then(Value::as_str))
                    .map(str::trim)
                    .find(|url| !url.is_empty())?;

                let text = |field: &str| {
                    map.get(field)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                };

                Some(Self {
                    url: url.to_string(),
                    name: text("name"),
                    category: text("category"),
                    folder: text("folder"),
                })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Category used for filtering: the category, else the folder.
    #[must_use]
    pub fn effective_category(&self) -> Option<&str> {
        self.category().or_else(|| self.folder())
    }

    /// Returns the last path segment of the URL.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// Catalog snapshot persisted in the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCatalog {
    /// URL the catalog was fetched from.
    pub src: String,
    /// When the catalog was fetched.
    pub timestamp: DateTime<Utc>,
    /// Catalog entries.
    pub data: Vec<CatalogEntry>,
}

impl CachedCatalog {
    /// Default freshness window.
    pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

    /// Creates a snapshot fetched at `timestamp`.
    #[must_use]
    pub fn new(src: impl Into<String>, timestamp: DateTime<Utc>, data: Vec<CatalogEntry>) -> Self {
        Self {
            src: src.into(),
            timestamp,
            data,
        }
    }

    /// Returns true if the snapshot came from `src` and is younger than `max_age` at `now`.
    #[must_use]
    pub fn is_valid_for(&self, src: &str, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.src == src && now - self.timestamp < max_age
    }
}
