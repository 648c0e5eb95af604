//! HTTP adapters.

/// Shared HTTP client.
pub mod client;
/// Profile image upload client.
pub mod profile_client;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpClient};
pub use profile_client::{ClientIdentity, ProfileImageClient};
