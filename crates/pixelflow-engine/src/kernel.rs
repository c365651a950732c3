//! The local flow update stencil.
//!
//! For every cell the kernel computes four outgoing values and deposits
//! component `d` into slot `d` of the neighbour at offset `d`. Each slot
//! of a destination therefore has exactly one writer: the neighbour on
//! the opposite side. Where the destination lands is the sink's concern
//! (scratch site, edge buffer, or nowhere).

use pixelflow_core::{Direction, Site, SiteKind, SiteTypeRegistry};

/// Receives the deposits of one update pass.
///
/// Coordinates are region-local and may fall one cell outside the
/// region on any side.
pub trait FlowSink {
    /// Deposit `value` into slot `direction` of the cell at `(x, y)`.
    fn deposit(&mut self, x: isize, y: isize, direction: Direction, value: f64);
}

/// Outgoing flows of a cell, component `d` leaving in direction `d`.
///
/// Sources emit their instantaneous value in all four directions;
/// obstacles scatter their incoming flows through the coupling matrices.
pub fn outgoing_flows(kind: &SiteKind, flows: &[f64; 4], time: f64) -> [f64; 4] {
    match kind {
        SiteKind::Source(source) => [source.value(time); 4],
        SiteKind::Obstacle(obstacle) => obstacle.scatter(flows),
    }
}

/// Run the stencil over a `width × height` block of sites.
///
/// `sites` is read-only: it holds last step's flows. All writes go to
/// `sink`.
pub fn scatter_sites<S: FlowSink>(
    sites: &[Site],
    width: usize,
    registry: &SiteTypeRegistry,
    time: f64,
    sink: &mut S,
) {
    for (i, site) in sites.iter().enumerate() {
        let x = (i % width) as isize;
        let y = (i / width) as isize;
        let out = outgoing_flows(registry[site.type_id].kind(), &site.flows, time);
        for dir in Direction::ALL {
            let (dx, dy) = dir.offset();
            sink.deposit(x + dx, y + dy, dir, out[dir.index()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelflow_core::{Grid, SiteTypeId};
    use pixelflow_test_utils::{scenario_site_types, standard_site_types};
    use std::collections::HashMap;

    /// Counts writes per `(x, y, slot)`.
    #[derive(Default)]
    struct CountingSink {
        writes: HashMap<(isize, isize, usize), (usize, f64)>,
    }

    impl FlowSink for CountingSink {
        fn deposit(&mut self, x: isize, y: isize, direction: Direction, value: f64) {
            let entry = self
                .writes
                .entry((x, y, direction.index()))
                .or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 = value;
        }
    }

    #[test]
    fn no_slot_written_twice() {
        let registry = SiteTypeRegistry::new(standard_site_types()).unwrap();
        let mut sites = Grid::from_fn(5, 6, |r, c| {
            Site::new(SiteTypeId(((r * 6 + c) % 4) as u32), 21.0)
        });
        for (i, s) in sites.as_mut_slice().iter_mut().enumerate() {
            s.flows = [i as f64, 1.0, -0.5, 0.25];
        }
        let mut sink = CountingSink::default();
        scatter_sites(sites.as_slice(), 6, &registry, 0.01, &mut sink);

        assert_eq!(sink.writes.len(), 5 * 6 * 4);
        assert!(sink.writes.values().all(|(count, _)| *count == 1));
    }

    #[test]
    fn source_emits_into_facing_slots() {
        let registry = SiteTypeRegistry::new(scenario_site_types()).unwrap();
        let source = registry.id_of("Source").unwrap();
        let air = registry.id_of("Air").unwrap();
        let sites: Vec<Site> = (0..9)
            .map(|i| Site::new(if i == 4 { source } else { air }, 21.0))
            .collect();

        let t = 0.125;
        let mut sink = CountingSink::default();
        scatter_sites(&sites, 3, &registry, t, &mut sink);

        let expected = (std::f64::consts::TAU * t).sin();
        assert_eq!(sink.writes[&(2, 1, Direction::Right.index())].1, expected);
        assert_eq!(sink.writes[&(0, 1, Direction::Left.index())].1, expected);
        assert_eq!(sink.writes[&(1, 2, Direction::Down.index())].1, expected);
        assert_eq!(sink.writes[&(1, 0, Direction::Up.index())].1, expected);
        // Air with zero incoming flow emits nothing.
        assert_eq!(sink.writes[&(1, 1, Direction::Right.index())].1, 0.0);
    }

    #[test]
    fn edge_cells_deposit_outside_block() {
        let registry = SiteTypeRegistry::new(scenario_site_types()).unwrap();
        let source = registry.id_of("Source").unwrap();
        let sites = vec![Site::new(source, 21.0)];
        let mut sink = CountingSink::default();
        scatter_sites(&sites, 1, &registry, 0.25, &mut sink);
        let mut keys: Vec<_> = sink.writes.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![(-1, 0, 1), (0, -1, 3), (0, 1, 2), (1, 0, 0)]);
    }

    #[test]
    fn obstacle_uses_coupling_matrices() {
        let registry = SiteTypeRegistry::new(standard_site_types()).unwrap();
        let wall = registry.id_of("Wall").unwrap();
        let kind = registry[wall].kind();
        assert_eq!(
            outgoing_flows(kind, &[0.0, 3.0, 0.0, 0.0], 1.0),
            [-3.0, 0.0, 0.0, 0.0]
        );
    }
}
