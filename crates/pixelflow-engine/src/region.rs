//! A rectangular sub-grid and its per-step update.
//!
//! A [`Region`] exclusively owns its sites and its four edge buffers.
//! Neighbours are known only by [`RegionId`]; every cross-region write
//! goes through a [`Transport`].
//!
//! # Step lifecycle
//!
//! 1. [`prepare`](Region::prepare) snapshots the sites into a scratch
//!    buffer with zero flows and clears the edge buffers.
//! 2. [`update_flows`](Region::update_flows) runs the kernel over the
//!    current sites, writing into scratch or the edge buffers, then sends
//!    one packet per neighbour.
//! 3. [`receive_boundaries`](Region::receive_boundaries) applies exactly
//!    one packet from each neighbour to scratch.
//! 4. [`commit`](Region::commit) swaps scratch in;
//!    [`abandon`](Region::abandon) throws it away instead.
//! 5. [`update_temperatures`](Region::update_temperatures) heats lossy
//!    obstacles from their committed flows.

use std::sync::Arc;

use log::trace;
use smallvec::SmallVec;

use pixelflow_core::{
    BoundaryPacket, ConfigError, Direction, ExchangeError, Grid, Placement, RegionId, Site,
    SiteKind, SiteTypeId, SiteTypeRegistry, Transport,
};
use pixelflow_partition::Rect;

use crate::kernel::{scatter_sites, FlowSink};

/// One independently computed window of the global grid.
pub struct Region {
    id: RegionId,
    placement: Placement,
    rect: Rect,
    global_rows: usize,
    global_cols: usize,
    registry: Arc<SiteTypeRegistry>,
    default_type: SiteTypeId,
    initial_temperature: f32,
    sites: Vec<Site>,
    scratch: Option<Vec<Site>>,
    edges: [Vec<f64>; 4],
    neighbours: [Option<RegionId>; 4],
}

impl Region {
    /// Create a region filled with fresh default sites.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RegionId,
        placement: Placement,
        rect: Rect,
        global_rows: usize,
        global_cols: usize,
        registry: Arc<SiteTypeRegistry>,
        default_type: SiteTypeId,
        initial_temperature: f32,
    ) -> Self {
        let fresh = Site::new(default_type, initial_temperature);
        Self {
            id,
            placement,
            rect,
            global_rows,
            global_cols,
            registry,
            default_type,
            initial_temperature,
            sites: vec![fresh; rect.area()],
            scratch: None,
            edges: edge_buffers(rect),
            neighbours: [None; 4],
        }
    }

    // ── accessors ───────────────────────────────────────────────

    /// Region id.
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Placement hint.
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Extent in global coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.rect.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.rect.height
    }

    /// Neighbour on side `direction`.
    pub fn neighbour(&self, direction: Direction) -> Option<RegionId> {
        self.neighbours[direction.index()]
    }

    /// Whether a scratch buffer is staged.
    pub fn is_prepared(&self) -> bool {
        self.scratch.is_some()
    }

    /// Values staged for the neighbour on side `direction` this step.
    pub fn edge_buffer(&self, direction: Direction) -> &[f64] {
        &self.edges[direction.index()]
    }

    /// Committed sites, row-major.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    // ── topology ────────────────────────────────────────────────

    /// Record the neighbour on side `direction`.
    pub fn set_neighbour(&mut self, direction: Direction, neighbour: Option<RegionId>) {
        self.neighbours[direction.index()] = neighbour;
    }

    /// Move and resize the region.
    ///
    /// Cells inside both the old and the new rect keep their site type if
    /// `preserve` is set; their flows and temperature are reset. Every
    /// other cell becomes a fresh default site.
    pub fn resize(&mut self, rect: Rect, global_rows: usize, global_cols: usize, preserve: bool) {
        let old_rect = self.rect;
        let old_sites = std::mem::take(&mut self.sites);
        let default_type = self.default_type;
        let temperature = self.initial_temperature;

        self.sites = (0..rect.area())
            .map(|i| {
                let row = rect.y + i / rect.width;
                let col = rect.x + i % rect.width;
                let type_id = if preserve && old_rect.contains(row, col) {
                    let old = (row - old_rect.y) * old_rect.width + (col - old_rect.x);
                    old_sites[old].type_id
                } else {
                    default_type
                };
                Site::new(type_id, temperature)
            })
            .collect();
        self.rect = rect;
        self.global_rows = global_rows;
        self.global_cols = global_cols;
        self.scratch = None;
        self.edges = edge_buffers(rect);
    }

    // ── step phases ─────────────────────────────────────────────

    /// Phase 1: stage a zero-flow copy of the sites and clear edge buffers.
    pub fn prepare(&mut self) {
        self.scratch = Some(self.sites.iter().map(Site::prepared).collect());
        for edge in &mut self.edges {
            edge.fill(0.0);
        }
    }

    /// Phase 2a: run the kernel at simulated time `time` and send one
    /// boundary packet to every neighbour.
    ///
    /// Returns the number of packets sent.
    pub fn update_flows(
        &mut self,
        time: f64,
        transport: &dyn Transport,
    ) -> Result<usize, ExchangeError> {
        let scratch = self
            .scratch
            .as_mut()
            .ok_or(ExchangeError::NotPrepared { region: self.id })?;
        let mut sink = StagingSink {
            scratch,
            edges: &mut self.edges,
            rect: self.rect,
            global_rows: self.global_rows,
            global_cols: self.global_cols,
        };
        scatter_sites(&self.sites, self.rect.width, &self.registry, time, &mut sink);

        let outgoing: SmallVec<[BoundaryPacket; 4]> = Direction::ALL
            .iter()
            .filter_map(|&dir| {
                self.neighbours[dir.index()].map(|to| BoundaryPacket {
                    from: self.id,
                    to,
                    direction: dir,
                    values: self.edges[dir.index()].clone(),
                })
            })
            .collect();
        let sent = outgoing.len();
        for packet in outgoing {
            transport.send(packet)?;
        }
        Ok(sent)
    }

    /// Phase 2b: apply exactly one boundary packet from every neighbour.
    ///
    /// A packet travelling in direction `d` lands on this region's
    /// `d.opposite()` side, value `i` into slot `d` of the `i`-th cell
    /// along that edge.
    ///
    /// Returns the number of packets applied.
    pub fn receive_boundaries(&mut self, transport: &dyn Transport) -> Result<usize, ExchangeError> {
        let id = self.id;
        let (width, height) = (self.rect.width, self.rect.height);
        let scratch = self
            .scratch
            .as_mut()
            .ok_or(ExchangeError::NotPrepared { region: id })?;

        let mut seen = [false; 4];
        for packet in transport.receive(id)? {
            let side = packet.direction.opposite();
            if self.neighbours[side.index()] != Some(packet.from) || seen[side.index()] {
                return Err(ExchangeError::UnexpectedBoundary {
                    region: id,
                    from: packet.from,
                    direction: packet.direction,
                });
            }
            let expected = edge_len(width, height, side);
            if packet.values.len() != expected {
                return Err(ExchangeError::MalformedBoundary {
                    region: id,
                    from: packet.from,
                    expected,
                    got: packet.values.len(),
                });
            }
            let slot = packet.direction.index();
            for (i, value) in packet.values.iter().enumerate() {
                let (x, y) = edge_cell(width, height, side, i);
                scratch[y * width + x].flows[slot] = *value;
            }
            seen[side.index()] = true;
        }

        let mut applied = 0;
        for side in Direction::ALL {
            if let Some(neighbour) = self.neighbours[side.index()] {
                if !seen[side.index()] {
                    return Err(ExchangeError::MissingBoundary {
                        region: id,
                        side,
                        neighbour,
                    });
                }
                applied += 1;
            }
        }
        trace!("{id}: applied {applied} boundary packets");
        Ok(applied)
    }

    /// Phase 3: replace the sites with the staged scratch buffer.
    pub fn commit(&mut self) -> Result<(), ExchangeError> {
        self.sites = self
            .scratch
            .take()
            .ok_or(ExchangeError::NotPrepared { region: self.id })?;
        Ok(())
    }

    /// Drop any staged state, leaving the committed sites untouched.
    pub fn abandon(&mut self) {
        self.scratch = None;
        for edge in &mut self.edges {
            edge.fill(0.0);
        }
    }

    /// Heat every lossy obstacle from its flows over `delta_time`.
    /// Sources keep their temperature.
    pub fn update_temperatures(&mut self, delta_time: f64) {
        let registry = &self.registry;
        for site in &mut self.sites {
            if let SiteKind::Obstacle(obstacle) = registry[site.type_id].kind() {
                let gain = obstacle.heat_gain(&site.flows, delta_time);
                site.temperature = (f64::from(site.temperature) + gain) as f32;
            }
        }
    }

    // ── queries ─────────────────────────────────────────────────

    /// Site at region-local `(row, col)`.
    pub fn site_at(&self, row: usize, col: usize) -> Option<&Site> {
        (row < self.rect.height && col < self.rect.width)
            .then(|| &self.sites[row * self.rect.width + col])
    }

    /// Site types as a local matrix.
    pub fn bulk_site_types(&self) -> Grid<SiteTypeId> {
        Grid::from_fn(self.rect.height, self.rect.width, |row, col| {
            self.sites[row * self.rect.width + col].type_id
        })
    }

    /// Displayed flow of one site at `elapsed_time`: a source's
    /// instantaneous value, or the sum of an obstacle's four flows.
    pub fn site_flow(&self, site: &Site, elapsed_time: f64) -> f64 {
        match self.registry[site.type_id].kind() {
            SiteKind::Source(source) => source.value(elapsed_time),
            SiteKind::Obstacle(_) => site.total_flow(),
        }
    }

    /// Flow in one direction at `elapsed_time`. A source reports its
    /// emitted value for every direction.
    pub fn site_directional_flow(&self, site: &Site, direction: Direction, elapsed_time: f64) -> f64 {
        match self.registry[site.type_id].kind() {
            SiteKind::Source(source) => source.value(elapsed_time),
            SiteKind::Obstacle(_) => site.flow(direction),
        }
    }

    /// [`site_flow`](Self::site_flow) for every site as a local matrix.
    pub fn global_flows(&self, elapsed_time: f64) -> Grid<f64> {
        Grid::from_fn(self.rect.height, self.rect.width, |row, col| {
            self.site_flow(&self.sites[row * self.rect.width + col], elapsed_time)
        })
    }

    // ── mutations ───────────────────────────────────────────────

    /// Overwrite every site type from a local matrix. Flows and
    /// temperatures are kept.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ShapeMismatch`] if the matrix is not
    /// `height × width`, [`ConfigError::UnknownSiteType`] if it holds an
    /// unregistered id. Nothing is written on error.
    pub fn set_site_types(&mut self, types: &Grid<SiteTypeId>) -> Result<(), ConfigError> {
        if types.shape() != (self.rect.height, self.rect.width) {
            return Err(ConfigError::ShapeMismatch {
                expected: (self.rect.height, self.rect.width),
                got: types.shape(),
            });
        }
        for id in types.as_slice() {
            self.registry.check(*id)?;
        }
        for (site, id) in self.sites.iter_mut().zip(types.as_slice()) {
            site.type_id = *id;
        }
        Ok(())
    }

    /// Set one site type at region-local `(row, col)`.
    pub fn set_site_type(&mut self, row: usize, col: usize, type_id: SiteTypeId) -> Result<(), ConfigError> {
        self.registry.check(type_id)?;
        let width = self.rect.width;
        if row >= self.rect.height || col >= width {
            return Err(ConfigError::ShapeMismatch {
                expected: (self.rect.height, width),
                got: (row + 1, col + 1),
            });
        }
        self.sites[row * width + col].type_id = type_id;
        Ok(())
    }

    /// Copy types from a global matrix for every cell of this region it
    /// covers. Used to carry types across re-tiling.
    pub(crate) fn restore_types(&mut self, global: &Grid<SiteTypeId>) {
        let rect = self.rect;
        for (i, site) in self.sites.iter_mut().enumerate() {
            let row = rect.y + i / rect.width;
            let col = rect.x + i % rect.width;
            if let Some(id) = global.get(row, col) {
                site.type_id = *id;
            }
        }
    }
}

// ── staging ────────────────────────────────────────────────────────

/// Routes kernel deposits for one region: inside the region into scratch,
/// across an internal edge into the edge buffer, off the global grid
/// nowhere.
struct StagingSink<'a> {
    scratch: &'a mut [Site],
    edges: &'a mut [Vec<f64>; 4],
    rect: Rect,
    global_rows: usize,
    global_cols: usize,
}

impl FlowSink for StagingSink<'_> {
    fn deposit(&mut self, x: isize, y: isize, direction: Direction, value: f64) {
        let width = self.rect.width as isize;
        let height = self.rect.height as isize;
        if (0..width).contains(&x) && (0..height).contains(&y) {
            let i = y as usize * self.rect.width + x as usize;
            self.scratch[i].flows[direction.index()] = value;
            return;
        }
        let global_col = self.rect.x as isize + x;
        let global_row = self.rect.y as isize + y;
        if global_col < 0
            || global_row < 0
            || global_col >= self.global_cols as isize
            || global_row >= self.global_rows as isize
        {
            return;
        }
        let along = if direction.is_horizontal() { y } else { x };
        self.edges[direction.index()][along as usize] = value;
    }
}

fn edge_len(width: usize, height: usize, side: Direction) -> usize {
    if side.is_horizontal() {
        height
    } else {
        width
    }
}

fn edge_buffers(rect: Rect) -> [Vec<f64>; 4] {
    Direction::ALL.map(|dir| vec![0.0; edge_len(rect.width, rect.height, dir)])
}

/// Local `(x, y)` of the `i`-th cell along `side`.
fn edge_cell(width: usize, height: usize, side: Direction, i: usize) -> (usize, usize) {
    match side {
        Direction::Right => (width - 1, i),
        Direction::Left => (0, i),
        Direction::Down => (i, height - 1),
        Direction::Up => (i, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelflow_test_utils::{scenario_site_types, standard_site_types, MemoryTransport};

    fn region(rect: Rect, rows: usize, cols: usize) -> Region {
        let registry = Arc::new(SiteTypeRegistry::new(standard_site_types()).unwrap());
        Region::new(
            RegionId::new(0, 0),
            Placement::local(1),
            rect,
            rows,
            cols,
            registry,
            SiteTypeId(0),
            21.0,
        )
    }

    fn scenario_region(id: RegionId, rect: Rect, rows: usize, cols: usize) -> Region {
        let registry = Arc::new(SiteTypeRegistry::new(scenario_site_types()).unwrap());
        Region::new(id, Placement::local(1), rect, rows, cols, registry, SiteTypeId(0), 21.0)
    }

    // ── lifecycle ───────────────────────────────────────────────

    #[test]
    fn update_without_prepare_fails() {
        let mut r = region(Rect::new(0, 0, 2, 2), 2, 2);
        let t = MemoryTransport::new();
        assert_eq!(
            r.update_flows(0.0, &t).unwrap_err(),
            ExchangeError::NotPrepared {
                region: RegionId::new(0, 0)
            }
        );
        assert!(r.commit().is_err());
    }

    #[test]
    fn abandon_keeps_committed_sites() {
        let mut r = scenario_region(RegionId::new(0, 0), Rect::new(0, 0, 3, 3), 3, 3);
        r.set_site_type(1, 1, SiteTypeId(1)).unwrap();
        let before = r.sites().to_vec();
        r.prepare();
        r.update_flows(0.1, &MemoryTransport::new()).unwrap();
        r.abandon();
        assert!(!r.is_prepared());
        assert_eq!(r.sites(), &before[..]);
    }

    #[test]
    fn single_region_scenario() {
        let mut r = scenario_region(RegionId::new(0, 0), Rect::new(0, 0, 3, 3), 3, 3);
        r.set_site_type(1, 1, SiteTypeId(1)).unwrap();
        let t = MemoryTransport::new();
        r.prepare();
        assert_eq!(r.update_flows(0.125, &t).unwrap(), 0);
        assert_eq!(r.receive_boundaries(&t).unwrap(), 0);
        r.commit().unwrap();

        let v = (std::f64::consts::TAU * 0.125).sin();
        assert_eq!(r.site_at(1, 2).unwrap().flow(Direction::Right), v);
        assert_eq!(r.site_at(1, 0).unwrap().flow(Direction::Left), v);
        assert_eq!(r.site_at(2, 1).unwrap().flow(Direction::Down), v);
        assert_eq!(r.site_at(0, 1).unwrap().flow(Direction::Up), v);
        for (row, col) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(r.site_at(row, col).unwrap().flows, [0.0; 4]);
        }
    }

    #[test]
    fn global_boundary_writes_dropped() {
        let mut r = scenario_region(RegionId::new(0, 0), Rect::new(0, 0, 1, 1), 1, 1);
        r.set_site_type(0, 0, SiteTypeId(1)).unwrap();
        let t = MemoryTransport::new();
        r.prepare();
        r.update_flows(0.125, &t).unwrap();
        for dir in Direction::ALL {
            assert!(r.edge_buffer(dir).iter().all(|v| *v == 0.0));
        }
        assert_eq!(t.pending(), 0);
        r.receive_boundaries(&t).unwrap();
        r.commit().unwrap();
        assert_eq!(r.site_at(0, 0).unwrap().flows, [0.0; 4]);
    }

    // ── exchange ────────────────────────────────────────────────

    #[test]
    fn internal_edge_writes_go_to_edge_buffer() {
        // Left half of a 2x4 grid, source on its right edge.
        let mut r = scenario_region(RegionId::new(0, 0), Rect::new(0, 0, 2, 2), 2, 4);
        r.set_neighbour(Direction::Right, Some(RegionId::new(0, 1)));
        r.set_site_type(1, 1, SiteTypeId(1)).unwrap();
        let t = MemoryTransport::new();
        r.prepare();
        assert_eq!(r.update_flows(0.25, &t).unwrap(), 1);
        assert_eq!(r.edge_buffer(Direction::Right), &[0.0, 1.0]);
        let sent = t.take(RegionId::new(0, 1));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].direction, Direction::Right);
        assert_eq!(sent[0].values, vec![0.0, 1.0]);
    }

    #[test]
    fn incoming_packet_lands_on_opposite_side() {
        let mut r = scenario_region(RegionId::new(0, 1), Rect::new(2, 0, 2, 2), 2, 4);
        r.set_neighbour(Direction::Left, Some(RegionId::new(0, 0)));
        let t = MemoryTransport::new();
        t.inject(BoundaryPacket {
            from: RegionId::new(0, 0),
            to: RegionId::new(0, 1),
            direction: Direction::Right,
            values: vec![0.5, -0.25],
        });
        r.prepare();
        r.update_flows(0.0, &t).unwrap();
        // The region's own left packet went out; drop it before receiving.
        t.take(RegionId::new(0, 0));
        assert_eq!(r.receive_boundaries(&t).unwrap(), 1);
        r.commit().unwrap();
        assert_eq!(r.site_at(0, 0).unwrap().flow(Direction::Right), 0.5);
        assert_eq!(r.site_at(1, 0).unwrap().flow(Direction::Right), -0.25);
        assert_eq!(r.site_at(0, 1).unwrap().flows, [0.0; 4]);
    }

    #[test]
    fn missing_packet_reported() {
        let mut r = region(Rect::new(0, 0, 2, 2), 4, 2);
        r.set_neighbour(Direction::Down, Some(RegionId::new(1, 0)));
        r.prepare();
        let err = r.receive_boundaries(&MemoryTransport::new()).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::MissingBoundary {
                region: RegionId::new(0, 0),
                side: Direction::Down,
                neighbour: RegionId::new(1, 0),
            }
        );
    }

    #[test]
    fn wrong_length_packet_rejected() {
        let mut r = region(Rect::new(0, 0, 3, 2), 4, 3);
        r.set_neighbour(Direction::Down, Some(RegionId::new(1, 0)));
        let t = MemoryTransport::new();
        t.inject(BoundaryPacket {
            from: RegionId::new(1, 0),
            to: RegionId::new(0, 0),
            direction: Direction::Up,
            values: vec![1.0],
        });
        r.prepare();
        assert_eq!(
            r.receive_boundaries(&t).unwrap_err(),
            ExchangeError::MalformedBoundary {
                region: RegionId::new(0, 0),
                from: RegionId::new(1, 0),
                expected: 3,
                got: 1,
            }
        );
    }

    #[test]
    fn packet_from_stranger_rejected() {
        let mut r = region(Rect::new(0, 0, 2, 2), 2, 4);
        r.set_neighbour(Direction::Right, Some(RegionId::new(0, 1)));
        let t = MemoryTransport::new();
        t.inject(BoundaryPacket {
            from: RegionId::new(5, 5),
            to: RegionId::new(0, 0),
            direction: Direction::Left,
            values: vec![0.0, 0.0],
        });
        r.prepare();
        assert!(matches!(
            r.receive_boundaries(&t),
            Err(ExchangeError::UnexpectedBoundary { .. })
        ));
    }

    // ── temperature ─────────────────────────────────────────────

    #[test]
    fn temperature_rises_only_in_lossy_obstacles() {
        let mut r = region(Rect::new(0, 0, 3, 1), 1, 3);
        // Air, Water, Source
        r.set_site_types(&Grid::from_rows(vec![vec![SiteTypeId(0), SiteTypeId(2), SiteTypeId(3)]]).unwrap())
            .unwrap();
        for site in r.sites.iter_mut() {
            site.flows = [1.0, 1.0, 0.0, 0.0];
        }
        r.update_temperatures(0.1);
        assert_eq!(r.site_at(0, 0).unwrap().temperature, 21.0);
        assert!(r.site_at(0, 1).unwrap().temperature > 21.0);
        assert_eq!(r.site_at(0, 2).unwrap().temperature, 21.0);
    }

    // ── resize / bulk ───────────────────────────────────────────

    #[test]
    fn resize_preserves_overlap_types_only_when_asked() {
        let mut r = region(Rect::new(0, 0, 3, 3), 3, 3);
        r.set_site_type(2, 2, SiteTypeId(1)).unwrap();
        r.set_site_type(0, 0, SiteTypeId(2)).unwrap();

        r.resize(Rect::new(1, 1, 3, 3), 4, 4, true);
        assert_eq!(r.site_at(1, 1).unwrap().type_id, SiteTypeId(1));
        assert_eq!(r.site_at(2, 2).unwrap().type_id, SiteTypeId(0));
        assert_eq!(r.edge_buffer(Direction::Down).len(), 3);

        r.resize(Rect::new(1, 1, 3, 3), 4, 4, false);
        assert_eq!(r.site_at(1, 1).unwrap().type_id, SiteTypeId(0));
    }

    #[test]
    fn set_site_types_checks_shape_and_ids() {
        let mut r = region(Rect::new(0, 0, 2, 2), 2, 2);
        let wrong = Grid::filled(3, 2, SiteTypeId(0));
        assert!(matches!(
            r.set_site_types(&wrong),
            Err(ConfigError::ShapeMismatch { .. })
        ));
        let unknown = Grid::filled(2, 2, SiteTypeId(9));
        assert!(matches!(
            r.set_site_types(&unknown),
            Err(ConfigError::UnknownSiteType { .. })
        ));
        let ok = Grid::from_rows(vec![vec![SiteTypeId(1), SiteTypeId(2)], vec![SiteTypeId(3), SiteTypeId(0)]]).unwrap();
        r.set_site_types(&ok).unwrap();
        assert_eq!(r.bulk_site_types(), ok);
    }

    #[test]
    fn global_flows_report_source_value() {
        let mut r = scenario_region(RegionId::new(0, 0), Rect::new(0, 0, 2, 1), 1, 2);
        r.set_site_type(0, 0, SiteTypeId(1)).unwrap();
        r.sites[1].flows = [0.5, 0.25, 0.0, -0.125];
        let flows = r.global_flows(0.25);
        assert!((flows.as_slice()[0] - 1.0).abs() < 1e-12);
        assert_eq!(flows.as_slice()[1], 0.625);
    }
}
