//! PixelFlow: a partitioned 2-D energy-flow lattice simulation.
//!
//! Every cell of a rectangular grid is a *site* of some *site type*:
//! sources emit a time-dependent value in all four directions, obstacles
//! scatter the flow they receive through transmission and reflection
//! coefficients and turn the lost part into heat. The grid is tiled into
//! regions that update in parallel and exchange boundary flows each step.
//!
//! This is the facade crate that re-exports the public API of the
//! sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use pixelflow::prelude::*;
//!
//! // 32×32 grid of air, split into 2×2 regions.
//! let mut config = SimulationConfig::standard(32, 32).unwrap();
//! config.partition = PartitionGrid::new(2, 2).unwrap();
//! let mut manager = PartitionManager::new(config).unwrap();
//!
//! let source = manager.registry().id_of("Source").unwrap();
//! manager.set_site_type(16, 16, source).unwrap();
//! for _ in 0..20 {
//!     manager.step().unwrap();
//! }
//! assert_eq!(manager.iteration_count(), 20);
//! assert!(manager.all_flows().as_slice().iter().any(|f| *f != 0.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `pixelflow-core` | ids, site types, registry, errors, `Transport` |
//! | [`partition`] | `pixelflow-partition` | rectangles and the region tiling |
//! | [`engine`] | `pixelflow-engine` | regions, the flow kernel, the partition manager |
//! | [`io`] | `pixelflow-io` | grid files, value export, pixel classification |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and ids (`pixelflow-core`).
///
/// Site types and their coupling matrices, the [`types::SiteTypeRegistry`],
/// the error taxonomy, and the [`types::Transport`] trait.
pub use pixelflow_core as types;

/// Region tiling geometry (`pixelflow-partition`).
pub use pixelflow_partition as partition;

/// The partitioned simulation engine (`pixelflow-engine`).
///
/// [`engine::PartitionManager`] drives the step protocol over
/// [`engine::Region`]s connected by a transport.
pub use pixelflow_engine as engine;

/// Text formats around a grid (`pixelflow-io`).
pub use pixelflow_io as io;

/// Common imports for typical PixelFlow usage.
///
/// ```rust
/// use pixelflow::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use pixelflow_core::{
        Color, Direction, Grid, NodeId, Placement, RegionId, Site, SiteKind, SiteType,
        SiteTypeId, SiteTypeRegistry,
    };

    // Errors
    pub use pixelflow_core::{BoundsError, ConfigError, ExchangeError, SimError};

    // Partitioning
    pub use pixelflow_partition::{PartitionGrid, Rect};

    // Engine
    pub use pixelflow_engine::{
        ChannelTransport, ExecutionMode, PartitionManager, PlacementPlan, SimulationConfig,
        StepMetrics,
    };

    // I/O
    pub use pixelflow_io::{load_grid_config, save_grid_config, GridIoError};
}
