//! Benchmark profiles for the PixelFlow simulation.
//!
//! - [`reference_profile`]: 120x120 grid with a source, a wall, and a
//!   water pool, on any partition and execution mode
//! - [`stress_profile`]: the same scene at 480x480

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use pixelflow_core::standard::{SOURCE, WALL, WATER};
use pixelflow_engine::{ExecutionMode, PartitionManager, SimulationConfig};
use pixelflow_partition::PartitionGrid;

/// Build a 120x120 reference manager (14.4K cells).
///
/// Scene: a source left of centre, a vertical wall with a gap right of
/// it, and a water pool in the lower right quadrant.
pub fn reference_profile(partition: PartitionGrid, execution: ExecutionMode) -> PartitionManager {
    scene(120, partition, execution)
}

/// Build a 480x480 stress manager (~230K cells).
///
/// Same scene as [`reference_profile`] at 16x the cell count.
pub fn stress_profile(partition: PartitionGrid, execution: ExecutionMode) -> PartitionManager {
    scene(480, partition, execution)
}

fn scene(size: usize, partition: PartitionGrid, execution: ExecutionMode) -> PartitionManager {
    let mut config = SimulationConfig::standard(size, size).unwrap();
    config.partition = partition;
    config.execution = execution;
    let mut manager = PartitionManager::new(config).unwrap();

    let registry = manager.registry();
    let source = registry.id_of(SOURCE).unwrap();
    let wall = registry.id_of(WALL).unwrap();
    let water = registry.id_of(WATER).unwrap();

    let mut types = manager.all_site_types();
    let mid = size / 2;
    *types.get_mut(mid, size / 4).unwrap() = source;
    for row in (0..size).filter(|r| r.abs_diff(mid) > size / 20) {
        *types.get_mut(row, mid).unwrap() = wall;
    }
    for row in (3 * size / 5)..(9 * size / 10) {
        for col in (3 * size / 5)..(9 * size / 10) {
            *types.get_mut(row, col).unwrap() = water;
        }
    }
    manager.set_all_site_types(&types).unwrap();
    manager
}
