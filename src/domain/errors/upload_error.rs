//! Profile image upload error types.

use thiserror::Error;

use super::ImageLoadError;

/// Failure while uploading the selected avatar.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum UploadError {
    #[error("no usable credentials stored under {key}")]
    MissingCredentials { key: String },

    #[error("failed to fetch selected image: {0}")]
    Image(#[from] ImageLoadError),

    #[error("upload request failed: {message}")]
    Network { message: String },
}

impl UploadError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}
