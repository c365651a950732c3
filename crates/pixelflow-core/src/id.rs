//! Strongly-typed identifiers and region placement hints.

use std::fmt;

/// Position of a region inside the partition grid.
///
/// `row` counts partition rows from the top of the global grid, `col`
/// counts partition columns from the left. Region ids are stable for the
/// lifetime of a manager: re-tiling changes region extents, not ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId {
    /// Partition row.
    pub row: usize,
    /// Partition column.
    pub col: usize,
}

impl RegionId {
    /// Create a region id from its partition coordinates.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region({}, {})", self.row, self.col)
    }
}

/// Index of a [`SiteType`](crate::SiteType) in the registry.
///
/// `SiteTypeId(n)` is the n-th type passed at construction. The index is
/// the identity used by every site, grid file, and mutation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteTypeId(pub u32);

impl SiteTypeId {
    /// The id as a `usize` index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SiteTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteTypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies the process or machine a region is placed on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Node name used for in-process placement.
    pub const LOCAL: &'static str = "local";

    /// Create a node id from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The in-process node.
    pub fn local() -> Self {
        Self(Self::LOCAL.to_string())
    }

    /// The node name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

/// Where a region should run: a node plus the number of cores it offers.
///
/// Placement is a hint. The core never pins threads to cores; the node
/// is only consulted by the [`Transport`](crate::Transport) when a
/// boundary packet has to reach the region.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Target node.
    pub node: NodeId,
    /// Cores available on that node. Must be at least 1.
    pub cores: usize,
}

impl Placement {
    /// Create a placement hint.
    pub fn new(node: impl Into<String>, cores: usize) -> Self {
        Self {
            node: NodeId::new(node),
            cores,
        }
    }

    /// In-process placement with the given core count.
    pub fn local(cores: usize) -> Self {
        Self {
            node: NodeId::local(),
            cores,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.node, self.cores)
    }
}
