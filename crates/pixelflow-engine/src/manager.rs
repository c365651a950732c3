//! The partition manager: owns every region and drives the step protocol.
//!
//! # Step protocol
//!
//! ```text
//! prepare (all) ─┬─ update + send (all) ─┬─ receive + apply (all) ─┬─ commit (all) ─ temperature (all)
//!             barrier                 barrier                   barrier
//! ```
//!
//! Each phase is dispatched over every region and returns only once all
//! regions are done, which is the barrier. A failure anywhere before
//! commit abandons every region's scratch buffer and drops undelivered
//! packets, so the grid stays at its pre-step state and the step can be
//! retried.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;

use pixelflow_core::{
    BoundsError, ConfigError, Direction, Endpoint, ExchangeError, Grid, Placement, RegionId,
    SimError, Site, SiteType, SiteTypeId, SiteTypeRegistry, Transport,
};
use pixelflow_partition::{PartitionGrid, Rect, Tiling};

use crate::config::{SimulationConfig, SAMPLING};
use crate::metrics::StepMetrics;
use crate::region::Region;

/// Partitioned simulation of energy flow over a 2-D grid.
///
/// Created from a [`SimulationConfig`] via [`new()`](PartitionManager::new).
/// Every [`step()`](PartitionManager::step) advances the whole grid by one
/// iteration of `delta_time_per_iteration`.
///
/// # Example
///
/// ```ignore
/// let mut manager = PartitionManager::new(config)?;
/// manager.set_site_type(10, 10, source)?;
/// for _ in 0..100 {
///     manager.step()?;
/// }
/// let heat = manager.temperature_at(12, 10)?;
/// ```
pub struct PartitionManager {
    registry: Arc<SiteTypeRegistry>,
    default_type: SiteTypeId,
    initial_temperature: f32,
    delta_time: f64,
    max_flow: f64,
    iteration: u64,
    tiling: Tiling,
    regions: Grid<Region>,
    transport: Box<dyn Transport>,
    pool: Option<ThreadPool>,
    last_metrics: StepMetrics,
}

impl PartitionManager {
    /// Build the regions, wire their neighbours, bind them to the
    /// transport, and fill every site with the default type.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`SimulationConfig::validate`], plus
    /// [`ConfigError::ThreadPool`] or [`ConfigError::Transport`] if the
    /// worker pool or transport cannot be set up.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tiling = config.tiling()?;
        let placements = config.placement.resolve(config.partition)?;
        let thread_count = config.execution.resolved_thread_count(&placements);
        let SimulationConfig {
            site_types,
            default_type,
            initial_temperature,
            mut transport,
            ..
        } = config;

        let registry = Arc::new(SiteTypeRegistry::new(site_types)?);
        let default_type = registry
            .id_of(&default_type)
            .ok_or(ConfigError::UnknownDefaultType { name: default_type })?;

        let partition = tiling.partition();
        let mut regions = Grid::from_fn(partition.rows, partition.cols, |row, col| {
            let id = RegionId::new(row, col);
            Region::new(
                id,
                placements[partition.linear_index(id)].clone(),
                tiling.rect(id),
                tiling.rows(),
                tiling.cols(),
                Arc::clone(&registry),
                default_type,
                initial_temperature,
            )
        });
        for region in regions.as_mut_slice() {
            for (direction, neighbour) in tiling.neighbours(region.id()) {
                region.set_neighbour(direction, Some(neighbour));
            }
        }

        let endpoints: Vec<Endpoint> = regions
            .as_slice()
            .iter()
            .map(|r| Endpoint {
                region: r.id(),
                placement: r.placement().clone(),
            })
            .collect();
        transport.bind(&endpoints)?;

        let pool = thread_count
            .map(|n| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("pixelflow-worker-{i}"))
                    .build()
                    .map_err(|e| ConfigError::ThreadPool {
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let delta_time = match registry.max_source_frequency() {
            Some(frequency) => 1.0 / (frequency * SAMPLING),
            None => 1.0 / SAMPLING,
        };
        let max_flow = registry.max_source_amplitude();

        info!(
            "pixelflow: {}x{} grid, {}x{} regions, {} site types, dt={delta_time:.6}, transport={}, workers={}",
            tiling.rows(),
            tiling.cols(),
            partition.rows,
            partition.cols,
            registry.len(),
            transport.name(),
            thread_count.map_or_else(|| "sequential".to_string(), |n| n.to_string()),
        );

        Ok(Self {
            registry,
            default_type,
            initial_temperature,
            delta_time,
            max_flow,
            iteration: 0,
            tiling,
            regions,
            transport,
            pool,
            last_metrics: StepMetrics::default(),
        })
    }

    // ── stepping ────────────────────────────────────────────────

    /// Advance the simulation by exactly one iteration.
    ///
    /// Sources are sampled at the time the step advances to,
    /// `(iteration_count + 1) · delta_time_per_iteration`.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError`] if any boundary packet cannot be
    /// delivered or applied. The grid and iteration count are then
    /// exactly as they were before the call, and `step()` may be retried.
    pub fn step(&mut self) -> Result<StepMetrics, ExchangeError> {
        let step_start = Instant::now();
        let emit_time = (self.iteration + 1) as f64 * self.delta_time;
        let pool = self.pool.as_ref();
        let transport: &dyn Transport = &*self.transport;

        // Phase 1: prepare.
        let phase_start = Instant::now();
        broadcast(pool, self.regions.as_mut_slice(), Region::prepare);
        let prepare_us = phase_start.elapsed().as_micros() as u64;

        // Phase 2a: local update, send edge buffers.
        let phase_start = Instant::now();
        let sent = run_phase(pool, self.regions.as_mut_slice(), |r| {
            r.update_flows(emit_time, transport)
        });
        let update_us = phase_start.elapsed().as_micros() as u64;
        let sent = match sent {
            Ok(n) => n,
            Err(e) => return Err(self.abort_step("update", e)),
        };

        // Phase 2b: receive and apply neighbour buffers.
        let phase_start = Instant::now();
        let received = run_phase(pool, self.regions.as_mut_slice(), |r| {
            r.receive_boundaries(transport)
        });
        let exchange_us = phase_start.elapsed().as_micros() as u64;
        if let Err(e) = received {
            return Err(self.abort_step("exchange", e));
        }

        // Phase 3: commit.
        let phase_start = Instant::now();
        let committed = run_phase(pool, self.regions.as_mut_slice(), |r| r.commit().map(|()| 0));
        if let Err(e) = committed {
            return Err(self.abort_step("commit", e));
        }
        let commit_us = phase_start.elapsed().as_micros() as u64;

        let phase_start = Instant::now();
        let dt = self.delta_time;
        broadcast(pool, self.regions.as_mut_slice(), |r| r.update_temperatures(dt));
        let temperature_us = phase_start.elapsed().as_micros() as u64;

        self.iteration += 1;
        let metrics = StepMetrics {
            total_us: step_start.elapsed().as_micros() as u64,
            prepare_us,
            update_us,
            exchange_us,
            commit_us,
            temperature_us,
            packets_exchanged: sent,
            regions: self.regions.len(),
            cells: self.tiling.rows() * self.tiling.cols(),
        };
        debug!(
            "step {} done in {}us ({} packets)",
            self.iteration, metrics.total_us, metrics.packets_exchanged
        );
        self.last_metrics = metrics.clone();
        Ok(metrics)
    }

    /// Discard every staged buffer and in-flight packet.
    fn abort_step(&mut self, phase: &str, err: ExchangeError) -> ExchangeError {
        for region in self.regions.as_mut_slice() {
            region.abandon();
        }
        self.transport.discard_pending();
        warn!(
            "step {} aborted during {phase}: {err}; grid left unchanged",
            self.iteration + 1
        );
        err
    }

    // ── properties ──────────────────────────────────────────────

    /// Global row count.
    pub fn rows(&self) -> usize {
        self.tiling.rows()
    }

    /// Global column count.
    pub fn cols(&self) -> usize {
        self.tiling.cols()
    }

    /// Simulated time per step: `1 / (max source frequency · SAMPLING)`.
    pub fn delta_time_per_iteration(&self) -> f64 {
        self.delta_time
    }

    /// `iteration_count · delta_time_per_iteration`.
    pub fn elapsed_time(&self) -> f64 {
        self.iteration as f64 * self.delta_time
    }

    /// Largest source amplitude, for display scaling.
    pub fn max_flow(&self) -> f64 {
        self.max_flow
    }

    /// Completed steps.
    pub fn iteration_count(&self) -> u64 {
        self.iteration
    }

    /// The site type table.
    pub fn registry(&self) -> &SiteTypeRegistry {
        &self.registry
    }

    /// Id of the default site type.
    pub fn default_type(&self) -> SiteTypeId {
        self.default_type
    }

    /// Temperature given to fresh sites.
    pub fn initial_temperature(&self) -> f32 {
        self.initial_temperature
    }

    /// The partition grid.
    pub fn partition(&self) -> PartitionGrid {
        self.tiling.partition()
    }

    /// Number of regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Every region's extent, row-major by region.
    pub fn region_rects(&self) -> Vec<(RegionId, Rect)> {
        self.regions
            .as_slice()
            .iter()
            .map(|r| (r.id(), r.rect()))
            .collect()
    }

    /// Every region's placement hint, row-major by region.
    pub fn placements(&self) -> Vec<(RegionId, Placement)> {
        self.regions
            .as_slice()
            .iter()
            .map(|r| (r.id(), r.placement().clone()))
            .collect()
    }

    /// Metrics of the last successful step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The boundary transport.
    pub fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    /// Mutable access to the transport, e.g. to restore connectivity
    /// before retrying a failed step.
    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        &mut *self.transport
    }

    // ── point queries ───────────────────────────────────────────

    fn region_for(&self, row: usize, col: usize) -> Result<(&Region, usize, usize), BoundsError> {
        self.tiling.check_bounds(row, col)?;
        let id = self.tiling.locate(row, col);
        let region = self
            .regions
            .get(id.row, id.col)
            .ok_or(self.bounds_error(row, col))?;
        let rect = region.rect();
        Ok((region, row - rect.y, col - rect.x))
    }

    fn region_for_mut(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<(&mut Region, usize, usize), BoundsError> {
        self.tiling.check_bounds(row, col)?;
        let id = self.tiling.locate(row, col);
        let err = self.bounds_error(row, col);
        let region = self.regions.get_mut(id.row, id.col).ok_or(err)?;
        let rect = region.rect();
        Ok((region, row - rect.y, col - rect.x))
    }

    fn bounds_error(&self, row: usize, col: usize) -> BoundsError {
        BoundsError {
            row,
            col,
            rows: self.tiling.rows(),
            cols: self.tiling.cols(),
        }
    }

    /// Copy of the site at `(row, col)`.
    pub fn site_at(&self, row: usize, col: usize) -> Result<Site, BoundsError> {
        let (region, r, c) = self.region_for(row, col)?;
        region.site_at(r, c).copied().ok_or(self.bounds_error(row, col))
    }

    /// Temperature at `(row, col)`.
    pub fn temperature_at(&self, row: usize, col: usize) -> Result<f32, BoundsError> {
        Ok(self.site_at(row, col)?.temperature)
    }

    /// Type id at `(row, col)`.
    pub fn site_type_id_at(&self, row: usize, col: usize) -> Result<SiteTypeId, BoundsError> {
        Ok(self.site_at(row, col)?.type_id)
    }

    /// Site type at `(row, col)`.
    pub fn site_type_at(&self, row: usize, col: usize) -> Result<&SiteType, BoundsError> {
        let id = self.site_type_id_at(row, col)?;
        Ok(&self.registry[id])
    }

    /// Displayed flow at `(row, col)`: a source's instantaneous value,
    /// or the sum of an obstacle's four flows.
    pub fn global_flow_at(&self, row: usize, col: usize) -> Result<f64, BoundsError> {
        let (region, r, c) = self.region_for(row, col)?;
        let site = region.site_at(r, c).ok_or(self.bounds_error(row, col))?;
        Ok(region.site_flow(site, self.elapsed_time()))
    }

    /// Flow in slot `direction` at `(row, col)`: the flow travelling in
    /// `direction` that arrived there last step.
    pub fn directional_flow_at(
        &self,
        row: usize,
        col: usize,
        direction: Direction,
    ) -> Result<f64, BoundsError> {
        let (region, r, c) = self.region_for(row, col)?;
        let site = region.site_at(r, c).ok_or(self.bounds_error(row, col))?;
        Ok(region.site_directional_flow(site, direction, self.elapsed_time()))
    }

    // ── bulk queries ────────────────────────────────────────────

    /// Every site type as a global matrix.
    pub fn all_site_types(&self) -> Grid<SiteTypeId> {
        self.gather(self.default_type, |region| region.bulk_site_types())
    }

    /// Every displayed flow as a global matrix.
    pub fn all_flows(&self) -> Grid<f64> {
        let elapsed = self.elapsed_time();
        self.gather(0.0, |region| region.global_flows(elapsed))
    }

    fn gather<T: Copy>(&self, fill: T, local: impl Fn(&Region) -> Grid<T>) -> Grid<T> {
        let mut global = Grid::filled(self.rows(), self.cols(), fill);
        for region in self.regions.as_slice() {
            let rect = region.rect();
            let block = local(region);
            for row in 0..rect.height {
                for col in 0..rect.width {
                    if let (Some(dst), Some(src)) = (
                        global.get_mut(rect.y + row, rect.x + col),
                        block.get(row, col),
                    ) {
                        *dst = *src;
                    }
                }
            }
        }
        global
    }

    // ── mutations ───────────────────────────────────────────────

    /// Set the type at `(row, col)`. Flows and temperature are kept.
    ///
    /// # Errors
    ///
    /// [`SimError::Bounds`] for a bad coordinate, [`SimError::Config`]
    /// for an unregistered id.
    pub fn set_site_type(&mut self, row: usize, col: usize, type_id: SiteTypeId) -> Result<(), SimError> {
        self.registry.check(type_id)?;
        let (region, r, c) = self.region_for_mut(row, col)?;
        region.set_site_type(r, c, type_id)?;
        Ok(())
    }

    /// Overwrite every site type from a global `rows × cols` matrix.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ShapeMismatch`] or [`ConfigError::UnknownSiteType`];
    /// nothing is written on error.
    pub fn set_all_site_types(&mut self, types: &Grid<SiteTypeId>) -> Result<(), ConfigError> {
        if types.shape() != (self.rows(), self.cols()) {
            return Err(ConfigError::ShapeMismatch {
                expected: (self.rows(), self.cols()),
                got: types.shape(),
            });
        }
        for id in types.as_slice() {
            self.registry.check(*id)?;
        }
        let fallback = self.default_type;
        for region in self.regions.as_mut_slice() {
            let rect = region.rect();
            let block = Grid::from_fn(rect.height, rect.width, |row, col| {
                types
                    .get(rect.y + row, rect.x + col)
                    .copied()
                    .unwrap_or(fallback)
            });
            region.set_site_types(&block)?;
        }
        Ok(())
    }

    /// Cycle the type at `(row, col)` to the next registered type,
    /// wrapping around. Returns the new type id.
    pub fn advance_site_type(&mut self, row: usize, col: usize) -> Result<SiteTypeId, SimError> {
        let next = self.registry.next_id(self.site_type_id_at(row, col)?);
        self.set_site_type(row, col, next)?;
        Ok(next)
    }

    /// Give `(row, col)` the type currently at `(from_row, from_col)`.
    pub fn copy_site_type(
        &mut self,
        row: usize,
        col: usize,
        from_row: usize,
        from_col: usize,
    ) -> Result<(), SimError> {
        self.tiling.check_bounds(row, col)?;
        let source = self.site_type_id_at(from_row, from_col)?;
        self.set_site_type(row, col, source)
    }

    /// Resize the global grid to `rows × cols` and re-tile the regions.
    ///
    /// Every site's flows and temperature are reset. Cells that existed
    /// before keep their type when `preserve_types` is set; all others
    /// get the default type. The partition grid, placements, and
    /// iteration count are unchanged.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDimensions`] or
    /// [`ConfigError::PartitionTooFine`]; the grid is untouched on error.
    pub fn reinitialize_sites(
        &mut self,
        rows: usize,
        cols: usize,
        preserve_types: bool,
    ) -> Result<(), ConfigError> {
        let tiling = Tiling::new(rows, cols, self.tiling.partition())?;
        let snapshot = preserve_types.then(|| self.all_site_types());
        self.transport.discard_pending();

        for region in self.regions.as_mut_slice() {
            region.resize(tiling.rect(region.id()), rows, cols, preserve_types);
            if let Some(types) = &snapshot {
                region.restore_types(types);
            }
        }
        info!(
            "re-tiled to {rows}x{cols} (types {})",
            if preserve_types { "preserved" } else { "reset" }
        );
        self.tiling = tiling;
        Ok(())
    }
}

// ── phase dispatch ─────────────────────────────────────────────────

/// Run a fallible phase on every region and sum the per-region counts.
/// Returns once every region has finished or one has failed.
fn run_phase<F>(pool: Option<&ThreadPool>, regions: &mut [Region], op: F) -> Result<usize, ExchangeError>
where
    F: Fn(&mut Region) -> Result<usize, ExchangeError> + Send + Sync,
{
    match pool {
        Some(pool) => pool.install(|| {
            regions
                .par_iter_mut()
                .map(|r| op(r))
                .try_reduce(|| 0, |a, b| Ok(a + b))
        }),
        None => regions.iter_mut().try_fold(0, |acc, r| Ok(acc + op(r)?)),
    }
}

/// Run an infallible phase on every region.
fn broadcast<F>(pool: Option<&ThreadPool>, regions: &mut [Region], op: F)
where
    F: Fn(&mut Region) + Send + Sync,
{
    match pool {
        Some(pool) => pool.install(|| regions.par_iter_mut().for_each(|r| op(r))),
        None => regions.iter_mut().for_each(op),
    }
}
