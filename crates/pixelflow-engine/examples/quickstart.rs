//! PixelFlow quickstart: a source behind a slit, on four regions.
//!
//! Demonstrates:
//!   1. Building a `SimulationConfig` with the standard site types
//!   2. Splitting the grid into a 2x2 partition on four placement hints
//!   3. Drawing walls and a source, stepping in parallel
//!   4. Reading flows and temperatures, resetting the grid
//!
//! Run with:
//!   RUST_LOG=info cargo run --example quickstart

use pixelflow_core::standard::{SOURCE, WALL, WATER};
use pixelflow_core::Placement;
use pixelflow_engine::{ExecutionMode, PartitionManager, PlacementPlan, SimulationConfig};
use pixelflow_partition::PartitionGrid;

// ─── Grid parameters ────────────────────────────────────────────

const ROWS: usize = 24;
const COLS: usize = 48;
const STEPS: usize = 160;

// Wall column and the slit in it.
const WALL_COL: usize = 16;
const SLIT: std::ops::Range<usize> = 10..14;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = SimulationConfig::standard(ROWS, COLS)?;
    config.partition = PartitionGrid::new(2, 2)?;
    config.placement = PlacementPlan::Quadrants {
        top_left: Placement::new("node-a", 2),
        top_right: Placement::new("node-b", 2),
        bottom_left: Placement::new("node-c", 2),
        bottom_right: Placement::new("node-d", 2),
    };
    config.execution = ExecutionMode::Parallel { threads: None };
    let mut manager = PartitionManager::new(config)?;

    let registry = manager.registry();
    let (source, wall, water) = match (
        registry.id_of(SOURCE),
        registry.id_of(WALL),
        registry.id_of(WATER),
    ) {
        (Some(s), Some(w), Some(t)) => (s, w, t),
        _ => return Err("standard site types missing".into()),
    };

    for row in (0..ROWS).filter(|r| !SLIT.contains(r)) {
        manager.set_site_type(row, WALL_COL, wall)?;
    }
    manager.set_site_type(ROWS / 2, 4, source)?;
    for row in 16..22 {
        for col in 36..44 {
            manager.set_site_type(row, col, water)?;
        }
    }

    println!("=== PixelFlow Quickstart ===\n");
    for (id, rect) in manager.region_rects() {
        println!("  {id}: {rect}");
    }
    println!(
        "\n  dt = {:.6} s, max flow = {}\n",
        manager.delta_time_per_iteration(),
        manager.max_flow()
    );

    let mut total_us = 0;
    for _ in 0..STEPS {
        total_us += manager.step()?.total_us;
    }
    println!(
        "{STEPS} steps in {total_us}us ({:.1}us/step), t = {:.4} s\n",
        total_us as f64 / STEPS as f64,
        manager.elapsed_time()
    );

    // ASCII flow map: '#' wall, 'S' source, shade by |flow|.
    let flows = manager.all_flows();
    let types = manager.all_site_types();
    let scale = manager.max_flow().max(f64::EPSILON);
    for row in 0..ROWS {
        let line: String = (0..COLS)
            .map(|col| {
                let ty = types.get(row, col).copied();
                let flow = flows.get(row, col).copied().unwrap_or(0.0);
                if ty == Some(wall) {
                    '#'
                } else if ty == Some(source) {
                    'S'
                } else {
                    shade(flow.abs() / scale)
                }
            })
            .collect();
        println!("  {line}");
    }

    let warmest = (16..22)
        .flat_map(|row| (36..44).map(move |col| (row, col)))
        .filter_map(|(row, col)| manager.temperature_at(row, col).ok())
        .fold(f32::MIN, f32::max);
    println!("\nwarmest water cell: {warmest:.3} degrees");

    // Reset flows and temperatures, keep the drawing.
    manager.reinitialize_sites(ROWS, COLS, true)?;
    println!(
        "after reset: flow at slit = {}, temperature = {}",
        manager.global_flow_at(12, WALL_COL)?,
        manager.temperature_at(18, 40)?
    );
    Ok(())
}

fn shade(intensity: f64) -> char {
    match intensity {
        i if i > 0.5 => '@',
        i if i > 0.2 => 'o',
        i if i > 0.05 => '+',
        i if i > 0.01 => '.',
        _ => ' ',
    }
}
