//! In-memory key-value store.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::errors::StoreError;
use crate::domain::ports::KeyValueStorePort;

/// Non-durable store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `entries`, in order.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStorePort for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().retain(|(k, _)| k != key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().iter().map(|(k, _)| k.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overwrite_keeps_position() {
        let store = MemoryKeyValueStore::with_entries([("x", "1"), ("y", "2")]);
        store.set("x", "3").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["x", "y"]);
        assert_eq!(store.get("x").await.unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_remove_from_sync_context() {
        let store = MemoryKeyValueStore::with_entries([("x", "1"), ("y", "2")]);
        tokio_test::block_on(store.remove("x")).unwrap();

        assert_eq!(tokio_test::block_on(store.keys()).unwrap(), vec!["y"]);
        assert!(tokio_test::block_on(store.get("x")).unwrap().is_none());
    }
}
