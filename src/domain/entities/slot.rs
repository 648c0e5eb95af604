//! Image slot types.
//!
//! A slot is the placeholder a renderer shows for one catalog image before its
//! pixels are loaded.

use std::fmt;

/// Identity of a rendered slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(String);

impl SlotId {
    /// Creates a new `SlotId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a `SlotId` from an image URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Vertical extent of a slot in viewport coordinates (pixels, 0 = viewport top).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBounds {
    /// Top edge relative to the viewport top.
    pub top: f64,
    /// Bottom edge relative to the viewport top.
    pub bottom: f64,
}

impl SlotBounds {
    #[must_use]
    pub const fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    /// Returns true if any part of the slot lies inside a viewport of the given height.
    #[must_use]
    pub fn intersects(&self, viewport_height: f64) -> bool {
        self.top < viewport_height && self.bottom > 0.0
    }

    #[must_use]
    pub fn center(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Returns the bounds moved up by `offset` pixels (scrolling down).
    #[must_use]
    pub fn scrolled_by(&self, offset: f64) -> Self {
        Self::new(self.top - offset, self.bottom - offset)
    }
}

/// A slot waiting for its image.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Slot identity.
    pub id: SlotId,
    /// Image URL.
    pub url: String,
    /// Position in the grid.
    pub bounds: SlotBounds,
}

impl Slot {
    /// Creates a slot whose id is derived from the URL.
    #[must_use]
    pub fn for_url(url: impl Into<String>, bounds: SlotBounds) -> Self {
        let url = url.into();
        Self {
            id: SlotId::from_url(&url),
            url,
            bounds,
        }
    }
}

/// One report from a visibility observer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityEntry {
    /// Observed slot.
    pub slot: SlotId,
    pub bounds: SlotBounds,
    /// Whether the slot overlaps the viewport.
    pub is_intersecting: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_from_url() {
        let id = SlotId::from_url("https://example.com/avatars/cat.png");
        assert_eq!(id.as_str().len(), 32);
        assert_eq!(id, SlotId::from_url("https://example.com/avatars/cat.png"));
        assert_ne!(id, SlotId::from_url("https://example.com/avatars/dog.png"));
    }

    #[test]
    fn test_intersects() {
        assert!(SlotBounds::new(0.0, 100.0).intersects(800.0));
        assert!(SlotBounds::new(-50.0, 10.0).intersects(800.0));
        assert!(SlotBounds::new(790.0, 890.0).intersects(800.0));
        assert!(!SlotBounds::new(800.0, 900.0).intersects(800.0));
        assert!(!SlotBounds::new(-100.0, 0.0).intersects(800.0));
    }

    #[test]
    fn test_scrolled_by() {
        let bounds = SlotBounds::new(900.0, 1000.0).scrolled_by(500.0);
        assert_eq!(bounds, SlotBounds::new(400.0, 500.0));
    }
}
