//! Simulation configuration and validation.
//!
//! [`SimulationConfig`] is the builder-input for a
//! [`PartitionManager`](crate::PartitionManager).
//! [`validate()`](SimulationConfig::validate) checks every structural
//! invariant up front so construction either fully succeeds or leaves
//! nothing behind.

use std::fmt;

use indexmap::IndexMap;

use pixelflow_core::{
    standard_site_types, ConfigError, NodeId, Placement, SiteType, SiteTypeRegistry, Transport,
};
use pixelflow_partition::{PartitionGrid, Tiling};

use crate::transport::ChannelTransport;

/// Time steps per period of the fastest source.
pub const SAMPLING: f64 = 8.0;

/// Initial temperature used by [`SimulationConfig::new`].
pub const DEFAULT_INITIAL_TEMPERATURE: f32 = 21.0;

/// Upper bound on worker threads for [`ExecutionMode::Parallel`].
const MAX_THREADS: usize = 64;

// ── PlacementPlan ──────────────────────────────────────────────────

/// Assigns a [`Placement`] hint to every region.
///
/// Only the structure of a plan is validated at construction. Whether the
/// named nodes can actually be reached is the transport's business and
/// is discovered at the first exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PlacementPlan {
    /// Every region in this process, with all available cores.
    #[default]
    Local,
    /// Every region on the same node.
    Uniform(Placement),
    /// Regions assigned to the listed placements in row-major order,
    /// wrapping around.
    RoundRobin(Vec<Placement>),
    /// The four quadrants of the partition grid on four placements.
    /// Regions in the upper half of the partition rows are "top", regions
    /// in the left half of the partition columns are "left".
    Quadrants {
        /// Upper-left quadrant.
        top_left: Placement,
        /// Upper-right quadrant.
        top_right: Placement,
        /// Lower-left quadrant.
        bottom_left: Placement,
        /// Lower-right quadrant.
        bottom_right: Placement,
    },
    /// One placement per region, row-major.
    Explicit(Vec<Placement>),
}

impl PlacementPlan {
    /// Resolve to one placement per region in row-major region order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPlacement`] if a placement has an empty node
    /// name or zero cores, if a round-robin list is empty, or if an
    /// explicit list does not have one entry per region.
    pub fn resolve(&self, partition: PartitionGrid) -> Result<Vec<Placement>, ConfigError> {
        let placements: Vec<Placement> = match self {
            Self::Local => {
                let cores = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                vec![Placement::local(cores); partition.len()]
            }
            Self::Uniform(p) => vec![p.clone(); partition.len()],
            Self::RoundRobin(list) => {
                if list.is_empty() {
                    return Err(ConfigError::InvalidPlacement {
                        reason: "round-robin placement list is empty".into(),
                    });
                }
                (0..partition.len())
                    .map(|i| list[i % list.len()].clone())
                    .collect()
            }
            Self::Quadrants {
                top_left,
                top_right,
                bottom_left,
                bottom_right,
            } => partition
                .region_ids()
                .map(|id| {
                    let top = id.row * 2 < partition.rows;
                    let left = id.col * 2 < partition.cols;
                    match (top, left) {
                        (true, true) => top_left.clone(),
                        (true, false) => top_right.clone(),
                        (false, true) => bottom_left.clone(),
                        (false, false) => bottom_right.clone(),
                    }
                })
                .collect(),
            Self::Explicit(list) => {
                if list.len() != partition.len() {
                    return Err(ConfigError::InvalidPlacement {
                        reason: format!(
                            "{} placements for {} regions",
                            list.len(),
                            partition.len()
                        ),
                    });
                }
                list.clone()
            }
        };

        for p in &placements {
            if p.node.as_str().is_empty() {
                return Err(ConfigError::InvalidPlacement {
                    reason: "placement node name is empty".into(),
                });
            }
            if p.cores == 0 {
                return Err(ConfigError::InvalidPlacement {
                    reason: format!("node '{}' offers zero cores", p.node),
                });
            }
        }
        Ok(placements)
    }
}

// ── ExecutionMode ──────────────────────────────────────────────────

/// How the manager runs each phase across regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One region after another on the calling thread.
    #[default]
    Sequential,
    /// Regions in parallel on a dedicated thread pool.
    Parallel {
        /// Worker count. `None` sums the core hints of the distinct
        /// placement nodes. Clamped to `[1, 64]` either way.
        threads: Option<usize>,
    },
}

impl ExecutionMode {
    /// Resolve the worker count, or `None` for sequential execution.
    pub fn resolved_thread_count(&self, placements: &[Placement]) -> Option<usize> {
        match self {
            Self::Sequential => None,
            Self::Parallel { threads: Some(n) } => Some((*n).clamp(1, MAX_THREADS)),
            Self::Parallel { threads: None } => {
                let mut per_node: IndexMap<&NodeId, usize> = IndexMap::new();
                for p in placements {
                    let cores = per_node.entry(&p.node).or_insert(0);
                    *cores = (*cores).max(p.cores);
                }
                Some(per_node.values().sum::<usize>().clamp(1, MAX_THREADS))
            }
        }
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Everything needed to build a [`PartitionManager`](crate::PartitionManager).
///
/// Start from [`SimulationConfig::new`] and override public fields:
///
/// ```ignore
/// let mut config = SimulationConfig::new(215, 418, site_types, "Air");
/// config.partition = PartitionGrid::new(2, 2)?;
/// config.execution = ExecutionMode::Parallel { threads: None };
/// let manager = PartitionManager::new(config)?;
/// ```
pub struct SimulationConfig {
    /// Global row count.
    pub rows: usize,
    /// Global column count.
    pub cols: usize,
    /// Site types in id order.
    pub site_types: Vec<SiteType>,
    /// Name of the type every fresh site gets.
    pub default_type: String,
    /// Temperature every fresh site gets.
    pub initial_temperature: f32,
    /// How to cut the grid into regions.
    pub partition: PartitionGrid,
    /// Where each region should run.
    pub placement: PlacementPlan,
    /// Sequential or thread-pool dispatch.
    pub execution: ExecutionMode,
    /// Boundary exchange mechanism.
    pub transport: Box<dyn Transport>,
}

impl SimulationConfig {
    /// Single-region, sequential, in-process configuration.
    pub fn new(
        rows: usize,
        cols: usize,
        site_types: Vec<SiteType>,
        default_type: impl Into<String>,
    ) -> Self {
        Self {
            rows,
            cols,
            site_types,
            default_type: default_type.into(),
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            partition: PartitionGrid::single(),
            placement: PlacementPlan::Local,
            execution: ExecutionMode::Sequential,
            transport: Box::new(ChannelTransport::new()),
        }
    }

    /// [`new`](Self::new) with the standard Air/Wall/Water/Source table
    /// and Air as the default type.
    pub fn standard(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        Ok(Self::new(
            rows,
            cols,
            standard_site_types()?,
            pixelflow_core::standard::AIR,
        ))
    }

    /// Check structural invariants without building anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: bad dimensions, empty or
    /// duplicate site types, unknown default type, non-finite initial
    /// temperature, bad partition, or bad placement plan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiling()?;
        let registry = SiteTypeRegistry::new(self.site_types.clone())?;
        self.default_type_in(&registry)?;
        if !self.initial_temperature.is_finite() {
            return Err(ConfigError::InvalidTemperature {
                value: self.initial_temperature,
            });
        }
        self.placement.resolve(self.partition)?;
        Ok(())
    }

    pub(crate) fn tiling(&self) -> Result<Tiling, ConfigError> {
        Tiling::new(self.rows, self.cols, self.partition)
    }

    pub(crate) fn default_type_in(
        &self,
        registry: &SiteTypeRegistry,
    ) -> Result<pixelflow_core::SiteTypeId, ConfigError> {
        registry
            .id_of(&self.default_type)
            .ok_or_else(|| ConfigError::UnknownDefaultType {
                name: self.default_type.clone(),
            })
    }
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("site_types", &self.site_types)
            .field("default_type", &self.default_type)
            .field("initial_temperature", &self.initial_temperature)
            .field("partition", &self.partition)
            .field("placement", &self.placement)
            .field("execution", &self.execution)
            .field("transport", &self.transport.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelflow_test_utils::standard_site_types;

    fn config(rows: usize, cols: usize) -> SimulationConfig {
        SimulationConfig::new(rows, cols, standard_site_types(), "Air")
    }

    // ── validate ────────────────────────────────────────────────

    #[test]
    fn standard_config_defaults_to_air() {
        let config = SimulationConfig::standard(4, 4).unwrap();
        assert_eq!(config.default_type, "Air");
        assert_eq!(config.site_types.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(config(10, 10).validate().is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            config(0, 10).validate(),
            Err(ConfigError::InvalidDimensions { rows: 0, cols: 10 })
        ));
        assert!(matches!(
            config(10, 0).validate(),
            Err(ConfigError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn empty_types_rejected() {
        let mut c = config(4, 4);
        c.site_types.clear();
        assert_eq!(c.validate(), Err(ConfigError::EmptyRegistry));
    }

    #[test]
    fn unknown_default_rejected() {
        let mut c = config(4, 4);
        c.default_type = "Lava".into();
        assert_eq!(
            c.validate(),
            Err(ConfigError::UnknownDefaultType {
                name: "Lava".into()
            })
        );
    }

    #[test]
    fn nan_temperature_rejected() {
        let mut c = config(4, 4);
        c.initial_temperature = f32::NAN;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn partition_finer_than_grid_rejected() {
        let mut c = config(2, 8);
        c.partition = PartitionGrid { rows: 3, cols: 2 };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::PartitionTooFine { .. })
        ));
    }

    // ── placement ───────────────────────────────────────────────

    #[test]
    fn quadrants_follow_partition_halves() {
        let plan = PlacementPlan::Quadrants {
            top_left: Placement::new("tl", 16),
            top_right: Placement::new("tr", 16),
            bottom_left: Placement::new("bl", 16),
            bottom_right: Placement::new("br", 16),
        };
        let nodes: Vec<String> = plan
            .resolve(PartitionGrid::new(2, 4).unwrap())
            .unwrap()
            .into_iter()
            .map(|p| p.node.to_string())
            .collect();
        assert_eq!(nodes, ["tl", "tl", "tr", "tr", "bl", "bl", "br", "br"]);
    }

    #[test]
    fn single_row_quadrants_stay_on_top() {
        let plan = PlacementPlan::Quadrants {
            top_left: Placement::new("tl", 1),
            top_right: Placement::new("tr", 1),
            bottom_left: Placement::new("bl", 1),
            bottom_right: Placement::new("br", 1),
        };
        let resolved = plan.resolve(PartitionGrid::new(1, 2).unwrap()).unwrap();
        assert_eq!(resolved[0].node.as_str(), "tl");
        assert_eq!(resolved[1].node.as_str(), "tr");
    }

    #[test]
    fn round_robin_wraps() {
        let plan = PlacementPlan::RoundRobin(vec![Placement::new("a", 2), Placement::new("b", 2)]);
        let resolved = plan.resolve(PartitionGrid::new(1, 3).unwrap()).unwrap();
        assert_eq!(resolved[2].node.as_str(), "a");
        assert!(PlacementPlan::RoundRobin(vec![])
            .resolve(PartitionGrid::single())
            .is_err());
    }

    #[test]
    fn explicit_plan_needs_one_per_region() {
        let plan = PlacementPlan::Explicit(vec![Placement::local(1)]);
        assert!(plan.resolve(PartitionGrid::new(2, 1).unwrap()).is_err());
        assert!(plan.resolve(PartitionGrid::single()).is_ok());
    }

    #[test]
    fn zero_core_placement_rejected() {
        let plan = PlacementPlan::Uniform(Placement::new("host", 0));
        assert!(matches!(
            plan.resolve(PartitionGrid::single()),
            Err(ConfigError::InvalidPlacement { .. })
        ));
    }

    // ── execution ───────────────────────────────────────────────

    #[test]
    fn parallel_threads_sum_distinct_nodes() {
        let placements = vec![
            Placement::new("a", 4),
            Placement::new("a", 4),
            Placement::new("b", 6),
        ];
        let mode = ExecutionMode::Parallel { threads: None };
        assert_eq!(mode.resolved_thread_count(&placements), Some(10));
        assert_eq!(ExecutionMode::Sequential.resolved_thread_count(&placements), None);
    }

    #[test]
    fn explicit_threads_clamped() {
        assert_eq!(
            ExecutionMode::Parallel { threads: Some(0) }.resolved_thread_count(&[]),
            Some(1)
        );
        assert_eq!(
            ExecutionMode::Parallel { threads: Some(500) }.resolved_thread_count(&[]),
            Some(64)
        );
    }
}
