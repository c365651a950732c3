//! In-process boundary exchange over crossbeam channels.
//!
//! Every region gets one bounded mailbox. A mailbox holds at most one
//! packet per neighbour, so a full mailbox means a region sent twice in
//! one step.

use std::sync::{Arc, PoisonError, RwLock};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use indexmap::{IndexMap, IndexSet};
use log::{info, trace};

use pixelflow_core::{
    BoundaryPacket, ConfigError, Direction, Endpoint, ExchangeError, NodeId, Placement, RegionId,
    Transport,
};

// ── Reachability ───────────────────────────────────────────────────

/// Shared record of placement nodes that are currently down.
///
/// Cloning yields a handle onto the same record, so a caller can keep one
/// after moving the transport into a manager and bring a node back before
/// retrying a failed step.
#[derive(Clone, Debug, Default)]
pub struct Reachability {
    down: Arc<RwLock<IndexSet<NodeId>>>,
}

impl Reachability {
    /// Whether packets can reach `node`.
    pub fn is_reachable(&self, node: &NodeId) -> bool {
        !self
            .down
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(node)
    }

    /// Take `node` down.
    pub fn mark_unreachable(&self, node: NodeId) {
        info!("node '{node}' marked unreachable");
        self.down
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node);
    }

    /// Bring `node` back.
    pub fn mark_reachable(&self, node: &NodeId) {
        info!("node '{node}' marked reachable");
        self.down
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(node);
    }
}

// ── ChannelTransport ───────────────────────────────────────────────

struct Mailbox {
    placement: Placement,
    tx: Sender<BoundaryPacket>,
    rx: Receiver<BoundaryPacket>,
}

/// [`Transport`] backed by one crossbeam channel per region.
///
/// Regions on any node are delivered in-process. Packets to or from a
/// node marked down in the [`Reachability`] record fail with
/// [`ExchangeError::Unreachable`].
#[derive(Default)]
pub struct ChannelTransport {
    mailboxes: IndexMap<RegionId, Mailbox>,
    reachability: Reachability,
}

impl ChannelTransport {
    /// A transport with every node reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport sharing an existing reachability record.
    pub fn with_reachability(reachability: Reachability) -> Self {
        Self {
            mailboxes: IndexMap::new(),
            reachability,
        }
    }

    /// Handle onto this transport's reachability record.
    pub fn reachability(&self) -> Reachability {
        self.reachability.clone()
    }

    /// Number of bound regions.
    pub fn endpoint_count(&self) -> usize {
        self.mailboxes.len()
    }

    fn check_reachable(
        &self,
        packet: &BoundaryPacket,
        placement: &Placement,
    ) -> Result<(), ExchangeError> {
        if self.reachability.is_reachable(&placement.node) {
            Ok(())
        } else {
            Err(ExchangeError::Unreachable {
                from: packet.from,
                to: packet.to,
                direction: packet.direction,
                node: placement.node.clone(),
            })
        }
    }
}

impl Transport for ChannelTransport {
    fn name(&self) -> &str {
        "channel"
    }

    fn bind(&mut self, endpoints: &[Endpoint]) -> Result<(), ConfigError> {
        let mut mailboxes = IndexMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let (tx, rx) = crossbeam_channel::bounded(Direction::ALL.len());
            let mailbox = Mailbox {
                placement: endpoint.placement.clone(),
                tx,
                rx,
            };
            if mailboxes.insert(endpoint.region, mailbox).is_some() {
                return Err(ConfigError::Transport {
                    reason: format!("{} bound twice", endpoint.region),
                });
            }
        }
        self.mailboxes = mailboxes;
        Ok(())
    }

    fn send(&self, packet: BoundaryPacket) -> Result<(), ExchangeError> {
        let sender = self
            .mailboxes
            .get(&packet.from)
            .ok_or(ExchangeError::Disconnected {
                region: packet.from,
            })?;
        let receiver = self
            .mailboxes
            .get(&packet.to)
            .ok_or(ExchangeError::Disconnected { region: packet.to })?;
        self.check_reachable(&packet, &sender.placement)?;
        self.check_reachable(&packet, &receiver.placement)?;

        trace!(
            "{} -> {}: {} boundary, {} values",
            packet.from,
            packet.to,
            packet.direction,
            packet.values.len()
        );
        let to = packet.to;
        receiver.tx.try_send(packet).map_err(|e| match e {
            TrySendError::Full(_) => ExchangeError::MailboxFull { region: to },
            TrySendError::Disconnected(_) => ExchangeError::Disconnected { region: to },
        })
    }

    fn receive(&self, region: RegionId) -> Result<Vec<BoundaryPacket>, ExchangeError> {
        let mailbox = self
            .mailboxes
            .get(&region)
            .ok_or(ExchangeError::Disconnected { region })?;
        Ok(mailbox.rx.try_iter().collect())
    }

    fn discard_pending(&self) {
        for mailbox in self.mailboxes.values() {
            while mailbox.rx.try_recv().is_ok() {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Vec<Endpoint> {
        vec![
            Endpoint {
                region: RegionId::new(0, 0),
                placement: Placement::new("a", 1),
            },
            Endpoint {
                region: RegionId::new(0, 1),
                placement: Placement::new("b", 1),
            },
        ]
    }

    fn packet(values: Vec<f64>) -> BoundaryPacket {
        BoundaryPacket {
            from: RegionId::new(0, 0),
            to: RegionId::new(0, 1),
            direction: Direction::Right,
            values,
        }
    }

    #[test]
    fn delivers_to_target_mailbox() {
        let mut t = ChannelTransport::new();
        t.bind(&endpoints()).unwrap();
        assert_eq!(t.endpoint_count(), 2);
        t.send(packet(vec![1.0, 2.0])).unwrap();
        assert!(t.receive(RegionId::new(0, 0)).unwrap().is_empty());
        let got = t.receive(RegionId::new(0, 1)).unwrap();
        assert_eq!(got, vec![packet(vec![1.0, 2.0])]);
        assert!(t.receive(RegionId::new(0, 1)).unwrap().is_empty());
    }

    #[test]
    fn unreachable_node_reported_on_send() {
        let mut t = ChannelTransport::new();
        t.bind(&endpoints()).unwrap();
        let links = t.reachability();
        links.mark_unreachable(NodeId::new("b"));

        let err = t.send(packet(vec![0.0])).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::Unreachable {
                from: RegionId::new(0, 0),
                to: RegionId::new(0, 1),
                direction: Direction::Right,
                node: NodeId::new("b"),
            }
        );
        links.mark_reachable(&NodeId::new("b"));
        assert!(t.send(packet(vec![0.0])).is_ok());
    }

    #[test]
    fn unreachable_sender_reported() {
        let links = Reachability::default();
        links.mark_unreachable(NodeId::new("a"));
        let mut t = ChannelTransport::with_reachability(links);
        t.bind(&endpoints()).unwrap();
        assert!(matches!(
            t.send(packet(vec![0.0])),
            Err(ExchangeError::Unreachable { node, .. }) if node.as_str() == "a"
        ));
    }

    #[test]
    fn unknown_region_is_disconnected() {
        let t = ChannelTransport::new();
        assert_eq!(
            t.receive(RegionId::new(3, 3)).unwrap_err(),
            ExchangeError::Disconnected {
                region: RegionId::new(3, 3)
            }
        );
    }

    #[test]
    fn mailbox_overflow_detected() {
        let mut t = ChannelTransport::new();
        t.bind(&endpoints()).unwrap();
        for _ in 0..4 {
            t.send(packet(vec![])).unwrap();
        }
        assert_eq!(
            t.send(packet(vec![])).unwrap_err(),
            ExchangeError::MailboxFull {
                region: RegionId::new(0, 1)
            }
        );
        t.discard_pending();
        assert!(t.receive(RegionId::new(0, 1)).unwrap().is_empty());
    }

    #[test]
    fn duplicate_binding_rejected() {
        let mut t = ChannelTransport::new();
        let mut eps = endpoints();
        eps.push(eps[0].clone());
        assert!(matches!(t.bind(&eps), Err(ConfigError::Transport { .. })));
    }
}
