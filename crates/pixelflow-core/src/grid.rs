//! Dense row-major 2-D storage.

use crate::error::ConfigError;

/// A `rows × cols` matrix stored row-major.
///
/// Used for site arrays inside regions, the partition's table of regions,
/// and the global matrices returned by bulk queries.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid by calling `f(row, col)` for every cell in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(row, col));
            }
        }
        Self { rows, cols, cells }
    }

    /// Wrap a row-major vector.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ShapeMismatch`] if `cells.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, cells: Vec<T>) -> Result<Self, ConfigError> {
        if cells.len() != rows * cols {
            return Err(ConfigError::ShapeMismatch {
                expected: (rows, cols),
                got: (cells.len() / cols.max(1), cols),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a grid from nested rows.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDimensions`] for an empty matrix,
    /// [`ConfigError::RaggedMatrix`] if rows differ in length.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, ConfigError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(ConfigError::InvalidDimensions {
                rows: n_rows,
                cols: n_cols,
            });
        }
        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(ConfigError::RaggedMatrix {
                    row: i,
                    expected: n_cols,
                    got: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            cells,
        })
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        self.offset(row, col).map(|i| &self.cells[i])
    }

    /// Mutable cell at `(row, col)`.
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut T> {
        self.offset(row, col).map(move |i| &mut self.cells[i])
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Option<&[T]> {
        (row < self.rows).then(|| &self.cells[row * self.cols..(row + 1) * self.cols])
    }

    /// All cells, row-major.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// All cells, row-major, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Consume the grid, returning its row-major cells.
    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }

    /// Apply `f` to every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Grid<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
        }
    }

    /// Copy out as nested rows.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.cells
            .chunks(self.cols.max(1))
            .map(<[T]>::to_vec)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let g = Grid::from_fn(2, 3, |r, c| r * 10 + c);
        assert_eq!(g.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(g.get(1, 2), Some(&12));
        assert_eq!(g.get(2, 0), None);
        assert_eq!(g.get(0, 3), None);
        assert_eq!(g.row(1), Some(&[10, 11, 12][..]));
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::RaggedMatrix {
                row: 1,
                expected: 2,
                got: 1
            }
        );
        assert!(matches!(
            Grid::<u8>::from_rows(vec![]),
            Err(ConfigError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn rows_round_trip() {
        let rows = vec![vec![1, 2, 3], vec![4, 5, 6]];
        let g = Grid::from_rows(rows.clone()).unwrap();
        assert_eq!(g.shape(), (2, 3));
        assert_eq!(g.to_rows(), rows);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0; 4]).is_ok());
        assert!(Grid::from_vec(2, 2, vec![0; 5]).is_err());
    }

    #[test]
    fn get_mut_writes_through() {
        let mut g = Grid::filled(2, 2, 0u8);
        *g.get_mut(1, 0).unwrap() = 7;
        assert_eq!(g.map(|v| u32::from(*v) * 2).as_slice(), &[0, 0, 14, 0]);
    }
}
