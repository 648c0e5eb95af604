//! Key-value store error types.

use thiserror::Error;

/// Durable key-value store error variants.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store directory could not be determined")]
    NoLocation,
}
