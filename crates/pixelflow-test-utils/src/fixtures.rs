//! Site type tables and matrix helpers for tests and benchmarks.

use pixelflow_core::{Color, ConfigError, Grid, SiteType, SiteTypeId};

/// The standard table, in grid-file code order:
/// `0` Air, `1` Wall, `2` Water, `3` Source (24.5 Hz, amplitude 40).
pub fn standard_site_types() -> Vec<SiteType> {
    pixelflow_core::standard_site_types().expect("standard site types are valid")
}

/// `0` Air, `1` Source with amplitude 1 and frequency 1.
pub fn scenario_site_types() -> Vec<SiteType> {
    build(vec![
        SiteType::obstacle("Air", Color::WHITE, 1.0, 0.0, f32::MAX),
        SiteType::source("Source", Color::MAGENTA, 1.0, 1.0),
    ])
}

fn build(types: Vec<Result<SiteType, ConfigError>>) -> Vec<SiteType> {
    types
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("fixture site types are valid")
}

/// Type matrix from nested integer codes.
pub fn type_matrix(rows: &[&[u32]]) -> Grid<SiteTypeId> {
    Grid::from_rows(
        rows.iter()
            .map(|row| row.iter().map(|&v| SiteTypeId(v)).collect())
            .collect(),
    )
    .expect("fixture matrix is rectangular")
}
