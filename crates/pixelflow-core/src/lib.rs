//! Core types and traits for the PixelFlow simulation engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the PixelFlow workspace:
//! identifiers, the physical site model, the site type registry, error
//! types, and the [`Transport`] trait regions exchange boundaries through.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod direction;
pub mod error;
pub mod grid;
pub mod id;
pub mod registry;
pub mod site;
pub mod site_type;
pub mod standard;
pub mod transport;

pub use direction::Direction;
pub use error::{BoundsError, ConfigError, ExchangeError, SimError};
pub use grid::Grid;
pub use id::{NodeId, Placement, RegionId, SiteTypeId};
pub use registry::SiteTypeRegistry;
pub use site::Site;
pub use site_type::{Color, CouplingMatrix, ObstacleParams, SiteKind, SiteType, SourceParams};
pub use standard::standard_site_types;
pub use transport::{BoundaryPacket, Endpoint, Transport};
