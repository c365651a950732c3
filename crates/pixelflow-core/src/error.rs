//! Error types for the PixelFlow simulation engine.
//!
//! Organized by how far a failure reaches: configuration errors reject
//! construction or resize parameters, bounds errors reject a single
//! coordinate, and exchange errors abort an in-flight step.

use std::error::Error;
use std::fmt;

use crate::direction::Direction;
use crate::id::{NodeId, RegionId, SiteTypeId};

// ── ConfigError ────────────────────────────────────────────────────

/// Invalid construction, resize, or mutation parameters.
///
/// Raised synchronously; simulation state is unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Grid rows or columns are zero.
    InvalidDimensions {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },
    /// No site types were supplied.
    EmptyRegistry,
    /// Two site types share a name.
    DuplicateSiteType {
        /// The repeated name.
        name: String,
    },
    /// The default type name is not registered.
    UnknownDefaultType {
        /// The requested default.
        name: String,
    },
    /// A site type id is outside the registry.
    UnknownSiteType {
        /// The offending id.
        id: SiteTypeId,
        /// Number of registered types.
        count: usize,
    },
    /// Source or obstacle parameters violate their invariants.
    InvalidSiteParameters {
        /// Which invariant was violated.
        reason: String,
    },
    /// Initial temperature is NaN or infinite.
    InvalidTemperature {
        /// The rejected value.
        value: f32,
    },
    /// The partition grid has zero rows or columns.
    InvalidPartition {
        /// Partition rows.
        rows: usize,
        /// Partition columns.
        cols: usize,
    },
    /// The partition grid is finer than the simulation grid, which would
    /// produce empty regions.
    PartitionTooFine {
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
        /// Partition rows.
        partition_rows: usize,
        /// Partition columns.
        partition_cols: usize,
    },
    /// A matrix does not match the grid dimensions.
    ShapeMismatch {
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Supplied `(rows, cols)`.
        got: (usize, usize),
    },
    /// A matrix row has a different length from the first row.
    RaggedMatrix {
        /// Index of the first short or long row.
        row: usize,
        /// Length of row 0.
        expected: usize,
        /// Length of the offending row.
        got: usize,
    },
    /// A placement plan is malformed.
    InvalidPlacement {
        /// What is wrong with it.
        reason: String,
    },
    /// The worker thread pool could not be built.
    ThreadPool {
        /// Reason reported by the pool builder.
        reason: String,
    },
    /// The transport refused the region endpoints.
    Transport {
        /// Reason reported by the transport.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "grid dimensions must be at least 1x1, got {rows}x{cols}")
            }
            Self::EmptyRegistry => write!(f, "no site types registered"),
            Self::DuplicateSiteType { name } => {
                write!(f, "site type '{name}' registered more than once")
            }
            Self::UnknownDefaultType { name } => {
                write!(f, "default site type '{name}' is not registered")
            }
            Self::UnknownSiteType { id, count } => {
                write!(f, "site type id {id} out of range ({count} types registered)")
            }
            Self::InvalidSiteParameters { reason } => {
                write!(f, "invalid site parameters: {reason}")
            }
            Self::InvalidTemperature { value } => {
                write!(f, "initial temperature must be finite, got {value}")
            }
            Self::InvalidPartition { rows, cols } => {
                write!(f, "partition grid must be at least 1x1, got {rows}x{cols}")
            }
            Self::PartitionTooFine {
                rows,
                cols,
                partition_rows,
                partition_cols,
            } => write!(
                f,
                "{partition_rows}x{partition_cols} partition is finer than the {rows}x{cols} grid"
            ),
            Self::ShapeMismatch { expected, got } => write!(
                f,
                "matrix is {}x{}, expected {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            Self::RaggedMatrix { row, expected, got } => {
                write!(f, "row {row} has {got} entries, expected {expected}")
            }
            Self::InvalidPlacement { reason } => write!(f, "invalid placement: {reason}"),
            Self::ThreadPool { reason } => write!(f, "thread pool: {reason}"),
            Self::Transport { reason } => write!(f, "transport: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── BoundsError ────────────────────────────────────────────────────

/// A coordinate outside `[0, rows) × [0, cols)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundsError {
    /// Requested row.
    pub row: usize,
    /// Requested column.
    pub col: usize,
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coordinate ({}, {}) out of bounds for {}x{} grid",
            self.row, self.col, self.rows, self.cols
        )
    }
}

impl Error for BoundsError {}

// ── ExchangeError ──────────────────────────────────────────────────

/// A boundary buffer could not be delivered or applied.
///
/// Fatal to the in-flight step. The manager discards the step's staged
/// state before returning this, so the caller may retry once
/// connectivity is restored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeError {
    /// The placement node hosting one end of the exchange is unreachable.
    Unreachable {
        /// Sending region.
        from: RegionId,
        /// Receiving region.
        to: RegionId,
        /// Direction the flow was travelling.
        direction: Direction,
        /// The node that could not be reached.
        node: NodeId,
    },
    /// The transport has no live mailbox for this region.
    Disconnected {
        /// Region whose mailbox is missing or closed.
        region: RegionId,
    },
    /// A region's mailbox is full; more packets were sent than neighbours exist.
    MailboxFull {
        /// Region whose mailbox overflowed.
        region: RegionId,
    },
    /// A neighbour's boundary packet never arrived.
    MissingBoundary {
        /// Receiving region.
        region: RegionId,
        /// Side of the receiving region the packet was expected on.
        side: Direction,
        /// Region that should have sent it.
        neighbour: RegionId,
    },
    /// A packet arrived from a region that is not the neighbour on that
    /// side, or arrived twice.
    UnexpectedBoundary {
        /// Receiving region.
        region: RegionId,
        /// Claimed sender.
        from: RegionId,
        /// Direction the flow was travelling.
        direction: Direction,
    },
    /// A packet's length does not match the shared edge.
    MalformedBoundary {
        /// Receiving region.
        region: RegionId,
        /// Sending region.
        from: RegionId,
        /// Edge length of the receiving side.
        expected: usize,
        /// Number of values in the packet.
        got: usize,
    },
    /// An exchange phase ran on a region that was never prepared.
    NotPrepared {
        /// The unprepared region.
        region: RegionId,
    },
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable {
                from,
                to,
                direction,
                node,
            } => write!(
                f,
                "node '{node}' unreachable sending {direction} boundary from {from} to {to}"
            ),
            Self::Disconnected { region } => write!(f, "{region} has no live mailbox"),
            Self::MailboxFull { region } => write!(f, "{region} mailbox is full"),
            Self::MissingBoundary {
                region,
                side,
                neighbour,
            } => write!(
                f,
                "{region} received no {side} boundary from neighbour {neighbour}"
            ),
            Self::UnexpectedBoundary {
                region,
                from,
                direction,
            } => write!(
                f,
                "{region} received unexpected {direction} boundary from {from}"
            ),
            Self::MalformedBoundary {
                region,
                from,
                expected,
                got,
            } => write!(
                f,
                "{region} received {got} boundary values from {from}, expected {expected}"
            ),
            Self::NotPrepared { region } => write!(f, "{region} was not prepared for this step"),
        }
    }
}

impl Error for ExchangeError {}

// ── SimError ───────────────────────────────────────────────────────

/// Any error a manager call can surface.
///
/// Used by operations that can fail in more than one way, such as
/// setting a site type (bad coordinate or unknown type id).
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    /// Configuration error.
    Config(ConfigError),
    /// Coordinate out of bounds.
    Bounds(BoundsError),
    /// Boundary exchange failure.
    Exchange(ExchangeError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration: {e}"),
            Self::Bounds(e) => write!(f, "bounds: {e}"),
            Self::Exchange(e) => write!(f, "exchange: {e}"),
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bounds(e) => Some(e),
            Self::Exchange(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<BoundsError> for SimError {
    fn from(e: BoundsError) -> Self {
        Self::Bounds(e)
    }
}

impl From<ExchangeError> for SimError {
    fn from(e: ExchangeError) -> Self {
        Self::Exchange(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_error_names_both_regions() {
        let e = ExchangeError::Unreachable {
            from: RegionId::new(0, 0),
            to: RegionId::new(0, 1),
            direction: Direction::Right,
            node: NodeId::new("host-b"),
        };
        let msg = e.to_string();
        assert!(msg.contains("host-b"));
        assert!(msg.contains("region(0, 0)"));
        assert!(msg.contains("region(0, 1)"));
        assert!(msg.contains("right"));
    }

    #[test]
    fn sim_error_chains_source() {
        let e: SimError = BoundsError {
            row: 5,
            col: 0,
            rows: 3,
            cols: 3,
        }
        .into();
        assert!(e.source().is_some());
        assert_eq!(
            e.to_string(),
            "bounds: coordinate (5, 0) out of bounds for 3x3 grid"
        );
    }
}
