//! Partitioned simulation engine for PixelFlow.
//!
//! Provides the [`PartitionManager`] that tiles the global grid into
//! [`Region`]s, wires their neighbours, and drives the per-step
//! prepare / update / exchange / commit protocol across them, either
//! sequentially or on a rayon thread pool. Regions exchange boundary
//! flows only through a [`Transport`](pixelflow_core::Transport); the
//! in-process default is [`ChannelTransport`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod kernel;
pub mod manager;
pub mod metrics;
pub mod region;
pub mod transport;

pub use config::{
    ExecutionMode, PlacementPlan, SimulationConfig, DEFAULT_INITIAL_TEMPERATURE, SAMPLING,
};
pub use kernel::{outgoing_flows, scatter_sites, FlowSink};
pub use manager::PartitionManager;
pub use metrics::StepMetrics;
pub use region::Region;
pub use transport::{ChannelTransport, Reachability};
