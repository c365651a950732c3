//! Text formats around a PixelFlow grid.
//!
//! - [`read_grid_config`] / [`write_grid_config`] parse and emit the
//!   grid configuration format: a `rows,cols` header followed by one line
//!   of comma-separated site type indices per row.
//! - [`load_grid_config`] / [`save_grid_config`] apply that format to a
//!   running [`PartitionManager`](pixelflow_engine::PartitionManager).
//! - [`write_grid_values`] dumps every cell's flows and temperature.
//! - [`classify_pixel`] / [`grid_from_pixels`] turn an already-decoded
//!   RGB image into a type matrix.
//!
//! # Format
//!
//! ```text
//! 3,4
//! 0,0,1,0
//! 0,3,1,0
//! 0,0,1,2
//! ```
//!
//! All I/O is generic over `BufRead` / `Write`, so tests use byte slices
//! and `Vec<u8>` while callers pass files.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod export;
pub mod grid_file;
pub mod pixels;

pub use error::GridIoError;
pub use export::{write_grid_values, VALUES_HEADER};
pub use grid_file::{load_grid_config, read_grid_config, save_grid_config, write_grid_config};
pub use pixels::{classify_pixel, grid_from_pixels};

/// Separator between cells on a line.
pub const CELL_SEPARATOR: char = ',';

/// Separator between the values of one cell in a values export.
pub const FIELD_SEPARATOR: char = '_';
