//! Domain layer with core entities, pure services, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Filtering and prioritization.
pub mod services;

pub use entities::{CatalogEntry, Slot, SlotBounds, SlotId};
pub use errors::{ConfigurationError, FetchError, ImageLoadError, UploadError};
pub use services::{FilterCriteria, FilterEngine, PriorityPolicy};
