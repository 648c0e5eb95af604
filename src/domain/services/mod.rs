//! Pure domain services.

/// Catalog filtering.
pub mod filter_engine;
/// Grid geometry.
pub mod grid_layout;
/// Load priorities.
pub mod load_priority;

pub use filter_engine::{DEFAULT_ALL_LABEL, FilterCriteria, FilterEngine, placeholder_avatars};
pub use grid_layout::GridLayout;
pub use load_priority::{PriorityPolicy, spatial_priority};
