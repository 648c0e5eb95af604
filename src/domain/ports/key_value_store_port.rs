//! Durable key-value store port definition.

use async_trait::async_trait;

use crate::domain::errors::StoreError;

/// Port for a string key-value store that survives restarts.
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    /// Retrieves the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Returns all keys in insertion order.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;
}
