//! Axis-aligned windows into the global grid.

use std::fmt;

/// A rectangular window `(x, y, width, height)` into the global grid.
///
/// `x` is the first column, `y` the first row. Width and height are in
/// cells; an empty rect has zero area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// First column.
    pub x: usize,
    /// First row.
    pub y: usize,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl Rect {
    /// Create a rect.
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last column.
    pub const fn right(&self) -> usize {
        self.x + self.width
    }

    /// One past the last row.
    pub const fn bottom(&self) -> usize {
        self.y + self.height
    }

    /// Cell count.
    pub const fn area(&self) -> usize {
        self.width * self.height
    }

    /// Whether the rect has no cells.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the global cell `(row, col)` lies inside.
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.y && row < self.bottom() && col >= self.x && col < self.right()
    }

    /// Overlap of two rects, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Rect::new(x, y, right - x, bottom - y))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}) x [{}..{})",
            self.y,
            self.bottom(),
            self.x,
            self.right()
        )
    }
}
