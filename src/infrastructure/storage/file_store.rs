//! File-backed durable key-value store.
//!
//! All entries live in one JSON document, rewritten atomically on every
//! mutation. Entries keep insertion order; overwriting a key keeps its slot.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::errors::StoreError;
use crate::domain::ports::KeyValueStorePort;

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "kalibrado";
const APP_NAME: &str = "avatar-picker";
const STORE_FILE_NAME: &str = "store.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    entries: Vec<(String, String)>,
}

impl StoreDocument {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// Durable key-value store persisted as a JSON document.
pub struct FileKeyValueStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl std::fmt::Debug for FileKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKeyValueStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileKeyValueStore {
    /// Opens the store in the platform data directory.
    ///
    /// # Errors
    /// Returns error if the data directory cannot be determined or the file cannot be read.
    pub async fn open_default() -> Result<Self, StoreError> {
        let path = Self::default_path().ok_or(StoreError::NoLocation)?;
        Self::open(path).await
    }

    /// Default store location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join(STORE_FILE_NAME))
    }

    /// Opens the store at `path`.
    ///
    /// A missing file is an empty store. A corrupt file is logged and replaced
    /// by an empty store on the next write.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let document = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<StoreDocument>(&content) {
                Ok(document) => document,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Store file is corrupt, starting empty");
                    StoreDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Store file not found, starting empty");
                StoreDocument::default()
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = document.entries.len(), "Opened key-value store");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(document)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || save_atomically(&path, &content))
            .await
            .map_err(|e| std::io::Error::other(format!("store write task failed: {e}")))?
    }
}

fn save_atomically(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("Invalid path"))?;
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content)?;
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStorePort for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let document = self.document.lock().await;
        Ok(document
            .position(key)
            .map(|index| document.entries[index].1.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        match document.position(key) {
            Some(index) => document.entries[index].1 = value.to_string(),
            None => document.entries.push((key.to_string(), value.to_string())),
        }
        self.persist(&document).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        let Some(index) = document.position(key) else {
            return Ok(());
        };
        document.entries.remove(index);
        self.persist(&document).await
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let document = self.document.lock().await;
        Ok(document.entries.iter().map(|(k, _)| k.clone()).collect())
    }
}
