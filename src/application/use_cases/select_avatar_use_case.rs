//! Profile picture upload use case.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use crate::domain::entities::ServerCredentials;
use crate::domain::errors::UploadError;
use crate::domain::ports::{ImageFetchPort, KeyValueStorePort, ProfileImagePort};

/// Store keys the use case reads and writes.
#[derive(Debug, Clone)]
pub struct SelectAvatarKeys {
    /// Key of the credentials blob.
    pub credentials: String,
    /// Prefix of the keys holding the device id.
    pub device_prefix: String,
    /// Key the selected image URL is saved under.
    pub selected_image: String,
}

/// How an upload attempt ended.
#[derive(Debug)]
pub enum UploadOutcome {
    /// The server accepted the image.
    Uploaded,
    /// The upload did not happen or was rejected.
    Failed(UploadError),
}

impl UploadOutcome {
    /// Returns true if the image was uploaded.
    #[must_use]
    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded)
    }
}

/// Uploads the chosen avatar as the user's primary image.
pub struct SelectAvatarUseCase {
    images: Arc<dyn ImageFetchPort>,
    profile: Arc<dyn ProfileImagePort>,
    store: Arc<dyn KeyValueStorePort>,
    keys: SelectAvatarKeys,
}

impl SelectAvatarUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(
        images: Arc<dyn ImageFetchPort>,
        profile: Arc<dyn ProfileImagePort>,
        store: Arc<dyn KeyValueStorePort>,
        keys: SelectAvatarKeys,
    ) -> Self {
        Self {
            images,
            profile,
            store,
            keys,
        }
    }

    /// Uploads the image at `url`.
    ///
    /// The URL is saved as the selected image whatever the outcome.
    pub async fn execute(&self, url: &str) -> UploadOutcome {
        let outcome = match self.upload(url).await {
            Ok(()) => {
                info!(url = %url, "Profile image updated");
                UploadOutcome::Uploaded
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to update profile image");
                UploadOutcome::Failed(e)
            }
        };

        if let Err(e) = self.store.set(&self.keys.selected_image, url).await {
            warn!(error = %e, "Failed to save selected image");
        }
        outcome
    }

    async fn upload(&self, url: &str) -> Result<(), UploadError> {
        let credentials = self.credentials().await?;
        let device_id = self.device_id().await;

        let bytes = self.images.fetch_image(url).await?;
        let encoded = STANDARD.encode(&bytes);
        debug!(url = %url, bytes = bytes.len(), has_device = device_id.is_some(), "Encoded image");

        self.profile
            .upload_primary(&credentials, device_id.as_deref(), encoded)
            .await
    }

    async fn credentials(&self) -> Result<ServerCredentials, UploadError> {
        let missing = || UploadError::MissingCredentials {
            key: self.keys.credentials.clone(),
        };

        let raw = self
            .store
            .get(&self.keys.credentials)
            .await
            .map_err(|e| {
                debug!(error = %e, "Failed to read credentials");
                missing()
            })?
            .ok_or_else(missing)?;

        ServerCredentials::from_blob(&raw).ok_or_else(missing)
    }

    /// Value of the last key starting with the device prefix.
    async fn device_id(&self) -> Option<String> {
        let keys = match self.store.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                debug!(error = %e, "Failed to list store keys");
                return None;
            }
        };

        let key = keys
            .iter()
            .rev()
            .find(|k| k.starts_with(&self.keys.device_prefix))?;
        self.store.get(key).await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockImageFetcher, MockProfileImage, png_bytes};
    use crate::infrastructure::storage::MemoryKeyValueStore;

    const CREDENTIALS: &str =
        r#"{"Servers":[{"AccessToken":"tok-123","UserId":"user-1","Name":"home"}]}"#;
    const IMAGE: &str = "https://images.test/cat.png";

    fn keys() -> SelectAvatarKeys {
        SelectAvatarKeys {
            credentials: "jellyfin_credentials".to_string(),
            device_prefix: "_device".to_string(),
            selected_image: "jf-avatars-selected-img".to_string(),
        }
    }

    fn use_case(
        store: Arc<MemoryKeyValueStore>,
        profile: Arc<MockProfileImage>,
    ) -> SelectAvatarUseCase {
        let images = MockImageFetcher::new().with_image(IMAGE, png_bytes(2, 2));
        SelectAvatarUseCase::new(Arc::new(images), profile, store, keys())
    }

    #[tokio::test]
    async fn test_uploads_base64_with_last_device_id() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([
            ("_deviceId2", "old-device"),
            ("jellyfin_credentials", CREDENTIALS),
            ("_deviceId2_new", "new-device"),
        ]));
        let profile = Arc::new(MockProfileImage::default());

        let outcome = use_case(store.clone(), profile.clone()).execute(IMAGE).await;

        assert!(outcome.is_uploaded());
        let uploads = profile.uploads.lock();
        assert_eq!(uploads.len(), 1);
        let (user, device, body) = &uploads[0];
        assert_eq!(user, "user-1");
        assert_eq!(device.as_deref(), Some("new-device"));
        assert_eq!(STANDARD.decode(body).unwrap(), png_bytes(2, 2).to_vec());
        drop(uploads);

        assert_eq!(
            store.get("jf-avatars-selected-img").await.unwrap().as_deref(),
            Some(IMAGE)
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_still_saves_selection() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let profile = Arc::new(MockProfileImage::default());

        let outcome = use_case(store.clone(), profile.clone()).execute(IMAGE).await;

        assert!(matches!(
            outcome,
            UploadOutcome::Failed(UploadError::MissingCredentials { .. })
        ));
        assert!(profile.uploads.lock().is_empty());
        assert_eq!(
            store.get("jf-avatars-selected-img").await.unwrap().as_deref(),
            Some(IMAGE)
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([(
            "jellyfin_credentials",
            CREDENTIALS,
        )]));
        let profile = Arc::new(MockProfileImage::failing());

        let outcome = use_case(store.clone(), profile.clone()).execute(IMAGE).await;

        assert!(matches!(outcome, UploadOutcome::Failed(UploadError::Network { .. })));
        assert_eq!(profile.uploads.lock()[0].1, None);
        assert!(store.get("jf-avatars-selected-img").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreachable_image_fails_before_upload() {
        let store = Arc::new(MemoryKeyValueStore::with_entries([(
            "jellyfin_credentials",
            CREDENTIALS,
        )]));
        let profile = Arc::new(MockProfileImage::default());

        let outcome = use_case(store, profile.clone())
            .execute("https://images.test/missing.png")
            .await;

        assert!(matches!(outcome, UploadOutcome::Failed(UploadError::Image(_))));
        assert!(profile.uploads.lock().is_empty());
    }
}
