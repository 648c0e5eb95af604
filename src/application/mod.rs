//! Application layer with services and use cases.

/// Picker services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{CatalogCache, PickerSession, TranslationLoader, VisibilityTrigger};
pub use use_cases::{SelectAvatarUseCase, UploadOutcome};
