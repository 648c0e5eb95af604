//! Domain entity definitions.

mod catalog;
mod credentials;
mod image;
mod slot;

pub use catalog::{CachedCatalog, CatalogEntry};
pub use credentials::{AccessToken, ServerCredentials};
pub use image::{ImageSource, LoadedImage};
pub use slot::{Slot, SlotBounds, SlotId, VisibilityEntry};
