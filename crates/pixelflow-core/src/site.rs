//! Per-cell mutable state.

use crate::direction::Direction;
use crate::id::SiteTypeId;

/// One grid cell: its type, four directional flows, and temperature.
///
/// Owned exclusively by the region containing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Site {
    /// Index into the site type registry.
    pub type_id: SiteTypeId,
    /// Incoming flow per direction, in [`Direction`] slot order.
    pub flows: [f64; 4],
    /// Current temperature.
    pub temperature: f32,
}

impl Site {
    /// A fresh site with zero flow.
    pub const fn new(type_id: SiteTypeId, temperature: f32) -> Self {
        Self {
            type_id,
            flows: [0.0; 4],
            temperature,
        }
    }

    /// Flow in slot `direction`.
    pub fn flow(&self, direction: Direction) -> f64 {
        self.flows[direction.index()]
    }

    /// Sum of the four flow components.
    pub fn total_flow(&self) -> f64 {
        self.flows.iter().sum()
    }

    /// Copy of this site with the same type and temperature and zero
    /// flows; the write target of one update step.
    pub fn prepared(&self) -> Self {
        Self::new(self.type_id, self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_keeps_type_and_temperature() {
        let mut s = Site::new(SiteTypeId(2), 21.0);
        s.flows = [1.0, -2.0, 0.5, 3.0];
        s.temperature = 25.5;
        let p = s.prepared();
        assert_eq!(p.type_id, SiteTypeId(2));
        assert_eq!(p.temperature, 25.5);
        assert_eq!(p.flows, [0.0; 4]);
        assert_eq!(s.total_flow(), 2.5);
        assert_eq!(s.flow(Direction::Up), 3.0);
    }
}
