//! Remote JSON fetch error types.

use thiserror::Error;

/// Failure to obtain a JSON document (catalog, folder list, translations).
///
/// Always recovered locally: callers fall back to an empty result.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed JSON from {url}: {message}")]
    Parse { url: String, message: String },

    #[error("expected a JSON array from {url}")]
    NotAnArray { url: String },
}

impl FetchError {
    /// Creates network error.
    #[must_use]
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates parse error.
    #[must_use]
    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Returns the URL that failed.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::Parse { url, .. }
            | Self::NotAnArray { url } => url,
        }
    }
}
