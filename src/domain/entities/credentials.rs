//! Media server credentials read from the stored credentials blob.

use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Access token with masking and zeroize-on-drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken {
    value: String,
}

impl AccessToken {
    /// Creates a token, returning `None` for blank input.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return None;
        }
        Some(Self { value })
    }

    /// Returns token as string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.value.chars().collect();
        if chars.len() <= 10 {
            return "*".repeat(chars.len());
        }

        let visible_prefix: String = chars[..4].iter().collect();
        let visible_suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.masked()).finish()
    }
}

/// Credentials of the signed-in user on one server.
#[derive(Debug, Clone)]
pub struct ServerCredentials {
    /// Server-side user id.
    pub user_id: String,
    /// Session token.
    pub access_token: AccessToken,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsBlob {
    #[serde(default)]
    servers: Vec<ServerBlob>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServerBlob {
    access_token: Option<String>,
    user_id: Option<String>,
}

impl ServerCredentials {
    /// Parses the first server of a `{"Servers": [{"AccessToken", "UserId"}]}` blob.
    ///
    /// Returns `None` if the blob is malformed or the first server lacks a token or user id.
    #[must_use]
    pub fn from_blob(raw: &str) -> Option<Self> {
        let blob: CredentialsBlob = serde_json::from_str(raw).ok()?;
        let server = blob.servers.into_iter().next()?;
        let user_id = server.user_id.filter(|id| !id.trim().is_empty())?;
        let access_token = AccessToken::new(server.access_token?)?;

        Some(Self {
            user_id,
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blob() {
        let raw = r#"{"Servers":[{"AccessToken":"abcdef1234567890","UserId":"u1","Name":"srv"}]}"#;
        let creds = ServerCredentials::from_blob(raw).unwrap();
        assert_eq!(creds.user_id, "u1");
        assert_eq!(creds.access_token.as_str(), "abcdef1234567890");
    }

    #[test]
    fn test_from_blob_rejects_incomplete() {
        assert!(ServerCredentials::from_blob("not json").is_none());
        assert!(ServerCredentials::from_blob(r#"{"Servers":[]}"#).is_none());
        assert!(ServerCredentials::from_blob(r#"{"Servers":[{"UserId":"u1"}]}"#).is_none());
        assert!(
            ServerCredentials::from_blob(r#"{"Servers":[{"AccessToken":" ","UserId":"u1"}]}"#)
                .is_none()
        );
    }

    #[test]
    fn test_token_masked_in_debug() {
        let token = AccessToken::new("abcdef1234567890").unwrap();
        assert_eq!(token.masked(), "abcd...7890");
        assert!(!format!("{token:?}").contains("ef123456"));
    }

    #[test]
    fn test_multibyte_token_masked_by_char() {
        let short = AccessToken::new("aéééééé").unwrap();
        assert_eq!(short.masked(), "*******");
        assert!(format!("{short:?}").contains("*******"));

        let long = AccessToken::new("jéllyfïn-tökén-ü").unwrap();
        assert_eq!(long.masked(), "jéll...én-ü");
    }
}
