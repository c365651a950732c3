//! Splitting the global grid into a partition grid of regions.

use smallvec::SmallVec;

use pixelflow_core::{BoundsError, ConfigError, Direction, RegionId};

use crate::rect::Rect;

// ── PartitionGrid ──────────────────────────────────────────────────

/// How many regions to cut the grid into along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartitionGrid {
    /// Regions stacked vertically.
    pub rows: usize,
    /// Regions side by side.
    pub cols: usize,
}

impl PartitionGrid {
    /// A `rows × cols` partition.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPartition`] if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidPartition { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// A single region covering the whole grid.
    pub const fn single() -> Self {
        Self { rows: 1, cols: 1 }
    }

    /// Number of regions.
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Always `false` for a validated partition.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Region ids in row-major order.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> {
        let cols = self.cols;
        (0..self.len()).map(move |i| RegionId::new(i / cols, i % cols))
    }

    /// Row-major position of `id`.
    pub const fn linear_index(&self, id: RegionId) -> usize {
        id.row * self.cols + id.col
    }

    /// Validate a partition that may have been built as a struct literal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.rows, self.cols).map(|_| ())
    }
}

impl Default for PartitionGrid {
    fn default() -> Self {
        Self::single()
    }
}

// ── Tiling ─────────────────────────────────────────────────────────

/// A concrete tiling of a `rows × cols` grid.
///
/// Every region except those in the last partition row/column is
/// `chunk_rows × chunk_cols`; the last ones absorb the remainder, so the
/// rects cover the grid exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tiling {
    rows: usize,
    cols: usize,
    partition: PartitionGrid,
    chunk_rows: usize,
    chunk_cols: usize,
}

impl Tiling {
    /// Tile a `rows × cols` grid.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidDimensions`] if the grid is empty.
    /// - [`ConfigError::InvalidPartition`] if the partition is empty.
    /// - [`ConfigError::PartitionTooFine`] if the partition has more rows
    ///   or columns than the grid, which would leave regions without cells.
    pub fn new(rows: usize, cols: usize, partition: PartitionGrid) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::InvalidDimensions { rows, cols });
        }
        partition.validate()?;
        if rows < partition.rows || cols < partition.cols {
            return Err(ConfigError::PartitionTooFine {
                rows,
                cols,
                partition_rows: partition.rows,
                partition_cols: partition.cols,
            });
        }
        Ok(Self {
            rows,
            cols,
            partition,
            chunk_rows: rows / partition.rows,
            chunk_cols: cols / partition.cols,
        })
    }

    /// Global row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Global column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The partition grid.
    pub fn partition(&self) -> PartitionGrid {
        self.partition
    }

    /// Nominal `(rows, cols)` of a region before remainder absorption.
    pub fn chunk(&self) -> (usize, usize) {
        (self.chunk_rows, self.chunk_cols)
    }

    /// Extent of region `id` in global coordinates.
    pub fn rect(&self, id: RegionId) -> Rect {
        let x = id.col * self.chunk_cols;
        let y = id.row * self.chunk_rows;
        let width = if id.col + 1 == self.partition.cols {
            self.cols - x
        } else {
            self.chunk_cols
        };
        let height = if id.row + 1 == self.partition.rows {
            self.rows - y
        } else {
            self.chunk_rows
        };
        Rect::new(x, y, width, height)
    }

    /// All region rects in row-major region order.
    pub fn rects(&self) -> Vec<(RegionId, Rect)> {
        self.partition
            .region_ids()
            .map(|id| (id, self.rect(id)))
            .collect()
    }

    /// Region owning the in-bounds global cell `(row, col)`.
    pub fn locate(&self, row: usize, col: usize) -> RegionId {
        RegionId::new(
            (row / self.chunk_rows).min(self.partition.rows - 1),
            (col / self.chunk_cols).min(self.partition.cols - 1),
        )
    }

    /// Check that `(row, col)` lies in the grid.
    pub fn check_bounds(&self, row: usize, col: usize) -> Result<(), BoundsError> {
        if row < self.rows && col < self.cols {
            Ok(())
        } else {
            Err(BoundsError {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Neighbour of `id` in `direction`, if the partition has one there.
    pub fn neighbour(&self, id: RegionId, direction: Direction) -> Option<RegionId> {
        let (dx, dy) = direction.offset();
        let row = id.row.checked_add_signed(dy)?;
        let col = id.col.checked_add_signed(dx)?;
        (row < self.partition.rows && col < self.partition.cols).then(|| RegionId::new(row, col))
    }

    /// Every neighbour of `id` with the direction leading to it.
    pub fn neighbours(&self, id: RegionId) -> SmallVec<[(Direction, RegionId); 4]> {
        Direction::ALL
            .iter()
            .filter_map(|&dir| self.neighbour(id, dir).map(|n| (dir, n)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tiling(rows: usize, cols: usize, pr: usize, pc: usize) -> Tiling {
        Tiling::new(rows, cols, PartitionGrid::new(pr, pc).unwrap()).unwrap()
    }

    #[test]
    fn last_region_absorbs_remainder() {
        let t = tiling(10, 7, 3, 2);
        assert_eq!(t.chunk(), (3, 3));
        assert_eq!(t.rect(RegionId::new(0, 0)), Rect::new(0, 0, 3, 3));
        assert_eq!(t.rect(RegionId::new(2, 1)), Rect::new(3, 6, 4, 4));
        assert_eq!(t.rect(RegionId::new(1, 1)), Rect::new(3, 3, 4, 3));
    }

    #[test]
    fn locate_clamps_into_last_region() {
        let t = tiling(10, 7, 3, 2);
        assert_eq!(t.locate(9, 6), RegionId::new(2, 1));
        assert_eq!(t.locate(2, 2), RegionId::new(0, 0));
        assert_eq!(t.locate(3, 3), RegionId::new(1, 1));
    }

    #[test]
    fn partition_finer_than_grid_rejected() {
        let err = Tiling::new(2, 5, PartitionGrid { rows: 3, cols: 1 }).unwrap_err();
        assert!(matches!(err, ConfigError::PartitionTooFine { .. }));
        assert!(matches!(
            Tiling::new(0, 5, PartitionGrid::single()),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Tiling::new(4, 4, PartitionGrid { rows: 0, cols: 1 }),
            Err(ConfigError::InvalidPartition { .. })
        ));
    }

    #[test]
    fn corner_region_has_two_neighbours() {
        let t = tiling(8, 8, 2, 2);
        let n = t.neighbours(RegionId::new(0, 0));
        assert_eq!(
            n.as_slice(),
            &[
                (Direction::Right, RegionId::new(0, 1)),
                (Direction::Down, RegionId::new(1, 0)),
            ]
        );
        assert_eq!(t.neighbour(RegionId::new(1, 1), Direction::Up), Some(RegionId::new(0, 1)));
        assert_eq!(t.neighbour(RegionId::new(1, 1), Direction::Right), None);
    }

    #[test]
    fn bounds_are_half_open() {
        let t = tiling(3, 4, 1, 1);
        assert!(t.check_bounds(2, 3).is_ok());
        let err = t.check_bounds(3, 0).unwrap_err();
        assert_eq!((err.row, err.rows, err.cols), (3, 3, 4));
        assert!(t.check_bounds(0, 4).is_err());
    }

    proptest! {
        #[test]
        fn regions_cover_every_cell_exactly_once(
            rows in 1usize..40,
            cols in 1usize..40,
            pr in 1usize..6,
            pc in 1usize..6,
        ) {
            prop_assume!(pr <= rows && pc <= cols);
            let t = tiling(rows, cols, pr, pc);
            let rects = t.rects();
            for row in 0..rows {
                for col in 0..cols {
                    let owners: Vec<_> = rects
                        .iter()
                        .filter(|(_, r)| r.contains(row, col))
                        .map(|(id, _)| *id)
                        .collect();
                    prop_assert_eq!(owners.len(), 1);
                    prop_assert_eq!(owners[0], t.locate(row, col));
                }
            }
            prop_assert_eq!(rects.iter().map(|(_, r)| r.area()).sum::<usize>(), rows * cols);
            prop_assert!(rects.iter().all(|(_, r)| !r.is_empty()));
        }
    }
}
