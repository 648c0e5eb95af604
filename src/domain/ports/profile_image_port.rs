//! Port definition for the profile image upload endpoint.

use async_trait::async_trait;

use crate::domain::entities::ServerCredentials;
use crate::domain::errors::UploadError;

/// Port for replacing the user's primary profile image.
#[async_trait]
pub trait ProfileImagePort: Send + Sync {
    /// Uploads a base64-encoded image as the user's primary image.
    ///
    /// Only transport failures are errors; the response body is not inspected.
    async fn upload_primary(
        &self,
        credentials: &ServerCredentials,
        device_id: Option<&str>,
        image_base64: String,
    ) -> Result<(), UploadError>;
}
