//! Partition geometry for PixelFlow simulations.
//!
//! A [`Tiling`] cuts the global `rows × cols` grid into a
//! [`PartitionGrid`] of rectangular regions that cover every cell exactly
//! once. The last partition row and column absorb any remainder.
//!
//! All coordinate routing (global cell to owning region, neighbour
//! lookup, bounds checking) lives here so the engine never does its own
//! index arithmetic.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod rect;
pub mod tiling;

pub use rect::Rect;
pub use tiling::{PartitionGrid, Tiling};
