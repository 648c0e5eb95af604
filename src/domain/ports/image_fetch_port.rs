//! Port definition for downloading slot images.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::ImageLoadError;

/// Port for downloading raw image bytes.
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Downloads the bytes served at `url`.
    async fn fetch_image(&self, url: &str) -> Result<Bytes, ImageLoadError>;
}
