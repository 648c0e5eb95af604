//! Configuration error types.

use thiserror::Error;

/// Missing or invalid setup required by the picker.
///
/// Fatal to the initialization path that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ConfigurationError {
    #[error("the picker title translation is missing")]
    MissingTitle,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    /// Creates invalid value error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
