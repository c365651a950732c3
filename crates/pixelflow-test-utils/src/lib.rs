//! Test utilities and mock transports for PixelFlow development.
//!
//! Provides in-memory implementations of the core [`Transport`] trait
//! ([`MemoryTransport`], [`FailingTransport`]) and site type fixtures for
//! constructing test scenarios.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{scenario_site_types, standard_site_types, type_matrix};

use std::collections::HashMap;
use std::sync::Mutex;

use pixelflow_core::{
    BoundaryPacket, ConfigError, Endpoint, ExchangeError, NodeId, Placement, RegionId, Transport,
};

/// Mock implementation of [`Transport`].
///
/// Backed by a `Mutex<HashMap<RegionId, Vec<BoundaryPacket>>>`. Accepts
/// packets for any region, bound or not, so single regions can be driven
/// without a manager. Use [`inject`](MemoryTransport::inject) to stage a
/// neighbour's packet and [`take`](MemoryTransport::take) to inspect what
/// a region sent.
#[derive(Default)]
pub struct MemoryTransport {
    queues: Mutex<HashMap<RegionId, Vec<BoundaryPacket>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a packet as if a neighbour had sent it.
    pub fn inject(&self, packet: BoundaryPacket) {
        self.lock().entry(packet.to).or_default().push(packet);
    }

    /// Remove and return everything queued for `region`.
    pub fn take(&self, region: RegionId) -> Vec<BoundaryPacket> {
        self.lock().remove(&region).unwrap_or_default()
    }

    /// Total queued packets across all regions.
    pub fn pending(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RegionId, Vec<BoundaryPacket>>> {
        self.queues.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn bind(&mut self, _endpoints: &[Endpoint]) -> Result<(), ConfigError> {
        Ok(())
    }

    fn send(&self, packet: BoundaryPacket) -> Result<(), ExchangeError> {
        self.inject(packet);
        Ok(())
    }

    fn receive(&self, region: RegionId) -> Result<Vec<BoundaryPacket>, ExchangeError> {
        Ok(self.take(region))
    }

    fn discard_pending(&self) {
        self.lock().clear();
    }
}

/// A transport that delivers the first `healthy_sends` packets, then
/// reports the receiver's node as unreachable on every later send.
///
/// Used to check that a failed exchange leaves the grid untouched.
pub struct FailingTransport {
    inner: MemoryTransport,
    placements: HashMap<RegionId, Placement>,
    healthy_sends: usize,
    sends: Mutex<usize>,
}

impl FailingTransport {
    pub fn new(healthy_sends: usize) -> Self {
        Self {
            inner: MemoryTransport::new(),
            placements: HashMap::new(),
            healthy_sends,
            sends: Mutex::new(0),
        }
    }
}

impl Transport for FailingTransport {
    fn name(&self) -> &str {
        "failing"
    }

    fn bind(&mut self, endpoints: &[Endpoint]) -> Result<(), ConfigError> {
        self.placements = endpoints
            .iter()
            .map(|e| (e.region, e.placement.clone()))
            .collect();
        Ok(())
    }

    fn send(&self, packet: BoundaryPacket) -> Result<(), ExchangeError> {
        let mut sends = self.sends.lock().unwrap_or_else(|e| e.into_inner());
        if *sends >= self.healthy_sends {
            let node = self
                .placements
                .get(&packet.to)
                .map(|p| p.node.clone())
                .unwrap_or_else(NodeId::local);
            return Err(ExchangeError::Unreachable {
                from: packet.from,
                to: packet.to,
                direction: packet.direction,
                node,
            });
        }
        *sends += 1;
        self.inner.send(packet)
    }

    fn receive(&self, region: RegionId) -> Result<Vec<BoundaryPacket>, ExchangeError> {
        self.inner.receive(region)
    }

    fn discard_pending(&self) {
        self.inner.discard_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelflow_core::Direction;

    fn packet() -> BoundaryPacket {
        BoundaryPacket {
            from: RegionId::new(0, 0),
            to: RegionId::new(1, 0),
            direction: Direction::Down,
            values: vec![1.0],
        }
    }

    #[test]
    fn memory_transport_round_trip() {
        let t = MemoryTransport::new();
        t.send(packet()).unwrap();
        assert_eq!(t.pending(), 1);
        assert_eq!(t.receive(RegionId::new(1, 0)).unwrap(), vec![packet()]);
        assert_eq!(t.pending(), 0);
    }

    #[test]
    fn failing_transport_fails_after_budget() {
        let t = FailingTransport::new(1);
        t.send(packet()).unwrap();
        assert!(matches!(
            t.send(packet()),
            Err(ExchangeError::Unreachable { .. })
        ));
        assert_eq!(t.receive(RegionId::new(1, 0)).unwrap().len(), 1);
    }
}
