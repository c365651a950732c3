//! Cardinal directions and the canonical flow slot order.

use std::fmt;

/// One of the four cardinal directions.
///
/// The discriminant is the flow slot index used everywhere: site flow
/// arrays, coupling matrices, edge buffers, and per-direction queries.
/// Slot `d` of a site holds the flow *travelling in direction `d`* that
/// arrived at the site this step, i.e. the value deposited by the
/// neighbour on the `d.opposite()` side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards increasing column.
    Right = 0,
    /// Towards decreasing column.
    Left = 1,
    /// Towards increasing row.
    Down = 2,
    /// Towards decreasing row.
    Up = 3,
}

impl Direction {
    /// All directions in slot order.
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    /// Flow slot index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a slot index, if in range.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Direction::Right),
            1 => Some(Direction::Left),
            2 => Some(Direction::Down),
            3 => Some(Direction::Up),
            _ => None,
        }
    }

    /// The reverse direction.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
        }
    }

    /// `(dx, dy)` step to the neighbour in this direction, where `x` is the
    /// column and `y` the row.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
        }
    }

    /// Whether this direction moves along a row (left/right).
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Up => "up",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_indices_are_dense() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::from_index(i), Some(*dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn opposite_is_involution_and_negates_offset() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dx, dy) = dir.offset();
            assert_eq!(dir.opposite().offset(), (-dx, -dy));
            assert_ne!(dir.opposite(), dir);
        }
    }
}
