//! Profile image upload against the media server's user image endpoint.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, info, warn};

use crate::domain::entities::ServerCredentials;
use crate::domain::errors::UploadError;
use crate::domain::ports::ProfileImagePort;

/// Client identity sent in the `MediaBrowser` authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Client application name.
    pub client: String,
    /// Device name.
    pub device: String,
    /// Client version.
    pub version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client: "Jellyfin Web".to_string(),
            device: "Chrome".to_string(),
            version: "10.9.11".to_string(),
        }
    }
}

impl ClientIdentity {
    /// Builds the authorization header value.
    #[must_use]
    pub fn authorization(&self, device_id: Option<&str>, token: &str) -> String {
        format!(
            r#"MediaBrowser Client="{}", Device="{}", DeviceId="{}", Version="{}", Token="{}""#,
            self.client,
            self.device,
            device_id.unwrap_or_default(),
            self.version,
            token
        )
    }
}

/// Uploads avatars to `{base_url}/Users/{user_id}/Images/Primary`.
#[derive(Debug, Clone)]
pub struct ProfileImageClient {
    client: Client,
    base_url: String,
    identity: ClientIdentity,
}

impl ProfileImageClient {
    /// Creates a client for the server at `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, identity: ClientIdentity) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
        }
    }

    /// Endpoint for the user's primary image.
    #[must_use]
    pub fn endpoint(&self, user_id: &str) -> String {
        format!("{}/Users/{user_id}/Images/Primary", self.base_url)
    }

    fn headers(
        &self,
        credentials: &ServerCredentials,
        device_id: Option<&str>,
    ) -> Result<HeaderMap, UploadError> {
        let auth = self
            .identity
            .authorization(device_id, credentials.access_token.as_str());

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| UploadError::network(format!("invalid authorization header: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        Ok(headers)
    }
}

#[async_trait]
impl ProfileImagePort for ProfileImageClient {
    async fn upload_primary(
        &self,
        credentials: &ServerCredentials,
        device_id: Option<&str>,
        image_base64: String,
    ) -> Result<(), UploadError> {
        let url = self.endpoint(&credentials.user_id);
        debug!(
            url = %url,
            token = %credentials.access_token.masked(),
            size = image_base64.len(),
            "Uploading profile image"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.headers(credentials, device_id)?)
            .body(image_base64)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Profile image upload failed");
                UploadError::network(e.to_string())
            })?;

        info!(status = %response.status(), "Profile image upload sent");
        Ok(())
    }
}
