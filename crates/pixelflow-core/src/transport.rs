//! The boundary exchange seam between regions.
//!
//! Regions never hold references to each other. Each step, a region
//! hands one [`BoundaryPacket`] per neighbour to the [`Transport`], and
//! after the manager's barrier each region drains its own mailbox. The
//! transport may be an in-process channel set or a link to remote nodes.

use crate::direction::Direction;
use crate::error::{ConfigError, ExchangeError};
use crate::id::{Placement, RegionId};

/// Flow values leaving one region across a shared edge.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryPacket {
    /// Sending region.
    pub from: RegionId,
    /// Receiving region.
    pub to: RegionId,
    /// Direction the flow travels; the receiver applies the values on its
    /// `direction.opposite()` side, into slot `direction`.
    pub direction: Direction,
    /// One value per cell along the shared edge.
    pub values: Vec<f64>,
}

/// A region and where it runs, registered with a transport before the
/// first step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// The region.
    pub region: RegionId,
    /// Its placement hint.
    pub placement: Placement,
}

/// Delivers boundary packets between regions.
///
/// `send` and `receive` take `&self` because regions run their phases
/// concurrently on worker threads.
pub trait Transport: Send + Sync {
    /// Short human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Register the region endpoints. Called once when a manager is built.
    ///
    /// Implementations must not check reachability here; an unreachable
    /// node is reported by the first [`send`](Transport::send) that needs it.
    fn bind(&mut self, endpoints: &[Endpoint]) -> Result<(), ConfigError>;

    /// Queue a packet for `packet.to`.
    fn send(&self, packet: BoundaryPacket) -> Result<(), ExchangeError>;

    /// Drain every packet queued for `region`.
    fn receive(&self, region: RegionId) -> Result<Vec<BoundaryPacket>, ExchangeError>;

    /// Drop every queued packet. Called when a step is aborted.
    fn discard_pending(&self);
}
