//! Fixed-column grid geometry for slots.

use crate::domain::entities::SlotBounds;

/// Places slot `i` at row `i / columns`, scrolled by `scroll_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    columns: usize,
    row_height: f64,
    scroll_offset: f64,
}

impl GridLayout {
    /// Creates a layout. Zero columns are treated as one.
    #[must_use]
    pub fn new(columns: usize, row_height: f64) -> Self {
        Self {
            columns: columns.max(1),
            row_height,
            scroll_offset: 0.0,
        }
    }

    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    #[must_use]
    pub const fn row_height(&self) -> f64 {
        self.row_height
    }

    #[must_use]
    pub const fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Returns the same grid scrolled down to `offset` pixels.
    #[must_use]
    pub const fn scrolled_to(mut self, offset: f64) -> Self {
        self.scroll_offset = offset;
        self
    }

    /// Viewport-relative bounds of slot `index`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self, index: usize) -> SlotBounds {
        let row = (index / self.columns) as f64;
        let top = row * self.row_height - self.scroll_offset;
        SlotBounds::new(top, top + self.row_height)
    }

    /// Total height of a grid holding `count` slots.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn content_height(&self, count: usize) -> f64 {
        count.div_ceil(self.columns) as f64 * self.row_height
    }
}
