//! Presentation layer: the command-line front end.

/// Command-line application.
pub mod app;
/// Download directory renderer.
pub mod directory_renderer;

pub use app::{App, PickerRequest};
pub use directory_renderer::DirectoryRenderer;
