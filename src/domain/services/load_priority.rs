//! Viewport-distance based load priority.
//!
//! Lower values load sooner. Slots intersecting the viewport get the number of
//! 100px buckets between their center and the viewport center. Slots outside
//! the viewport get `OFFSCREEN_BASE` plus their distance to the nearest
//! viewport edge in buckets, so they always sort after visible slots.

use crate::domain::entities::SlotBounds;

/// Bucket size in pixels.
pub const BUCKET_PX: f64 = 100.0;

/// Priority floor for slots outside the viewport.
pub const OFFSCREEN_BASE: i64 = 20;

/// Priority used when spatial ordering is disabled.
pub const DEFAULT_STATIC_PRIORITY: i64 = 10;

/// How load priorities are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityPolicy {
    /// Order by distance to the viewport.
    #[default]
    Spatial,
    /// Every slot gets the same priority (FIFO loading).
    Static(i64),
}

impl PriorityPolicy {
    /// Builds the policy from the viewport-priority setting.
    #[must_use]
    pub const fn from_setting(prioritize_viewport: bool, static_priority: i64) -> Self {
        if prioritize_viewport {
            Self::Spatial
        } else {
            Self::Static(static_priority)
        }
    }

    /// Computes the priority of a slot.
    #[must_use]
    pub fn priority(self, bounds: SlotBounds, viewport_height: f64) -> i64 {
        match self {
            Self::Spatial => spatial_priority(bounds, viewport_height),
            Self::Static(value) => value,
        }
    }
}

/// Spatial priority of a slot for a viewport of the given height.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn spatial_priority(bounds: SlotBounds, viewport_height: f64) -> i64 {
    if bounds.intersects(viewport_height) {
        let distance = (bounds.center() - viewport_height / 2.0).abs();
        return (distance / BUCKET_PX).floor() as i64;
    }

    if bounds.top >= viewport_height {
        OFFSCREEN_BASE + (bounds.top / BUCKET_PX).floor() as i64
    } else {
        // Above the viewport: distance from the bottom edge of the slot to the viewport top.
        OFFSCREEN_BASE + (-bounds.bottom / BUCKET_PX).floor() as i64
    }
}
