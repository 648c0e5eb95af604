//! Port for the surface that displays slots.

use crate::domain::entities::{LoadedImage, SlotId};

/// Rendering surface notified when a slot's image settles.
///
/// Both calls may refer to a slot that is no longer displayed; implementations
/// must treat that as a no-op.
pub trait SlotRendererPort: Send + Sync {
    /// Shows the loaded image in its slot and makes the slot selectable.
    fn reveal(&self, slot: &SlotId, image: &LoadedImage);

    /// Removes a slot whose image failed to load.
    fn remove(&self, slot: &SlotId);
}
