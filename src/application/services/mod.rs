//! Application services.

/// Cached avatar catalog.
pub mod catalog_cache;
/// Open picker state.
pub mod picker_session;
/// UI string loading.
pub mod translation_loader;
/// Visibility-driven load scheduling.
pub mod visibility_trigger;
/// Polling helper.
pub mod wait_for;

pub use catalog_cache::CatalogCache;
pub use picker_session::{PickerSession, RenderSummary, SessionOptions, SessionServices};
pub use translation_loader::{TranslationLoader, Translations};
pub use visibility_trigger::{Registration, VisibilityTrigger};
pub use wait_for::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, wait_for};
