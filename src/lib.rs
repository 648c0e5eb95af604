//! Avatar picker - browse, filter and upload profile avatars for a media server.
//!
//! This crate loads a remote avatar catalog through a time-bounded cache,
//! filters it by category and search term, and loads slot images lazily
//! through a bounded-concurrency priority queue ordered by viewport distance.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing picker services and use cases.
pub mod application;
/// Domain layer containing entities, errors, pure services, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the command-line front end.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "avatar-picker";
