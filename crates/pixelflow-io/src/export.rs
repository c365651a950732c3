//! Per-cell value dumps.

use std::io::Write;

use pixelflow_core::Direction;
use pixelflow_engine::PartitionManager;

use crate::error::GridIoError;
use crate::{CELL_SEPARATOR, FIELD_SEPARATOR};

/// Comment line opening every values export.
pub const VALUES_HEADER: &str =
    "# Format of each grid cell: GlobalFlow_UpFlow_RightFlow_DownFlow_LeftFlow_Temperature";

/// Slot order of the directional fields in a values export.
const EXPORT_ORDER: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

/// Write every cell's displayed flow, four directional flows, and
/// temperature, one line per grid row.
///
/// Directional fields follow [`PartitionManager::directional_flow_at`]:
/// the `Up` field is the flow travelling up that arrived at the cell last
/// step.
pub fn write_grid_values<W: Write>(
    manager: &PartitionManager,
    mut writer: W,
) -> Result<(), GridIoError> {
    writeln!(writer, "{VALUES_HEADER}")?;
    let mut line = String::new();
    for row in 0..manager.rows() {
        line.clear();
        for col in 0..manager.cols() {
            if col > 0 {
                line.push(CELL_SEPARATOR);
            }
            line.push_str(&cell_fields(manager, row, col)?.join(&FIELD_SEPARATOR.to_string()));
        }
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

fn cell_fields(
    manager: &PartitionManager,
    row: usize,
    col: usize,
) -> Result<Vec<String>, GridIoError> {
    let mut fields = Vec::with_capacity(6);
    fields.push(manager.global_flow_at(row, col)?.to_string());
    for direction in EXPORT_ORDER {
        fields.push(manager.directional_flow_at(row, col, direction)?.to_string());
    }
    fields.push(manager.temperature_at(row, col)?.to_string());
    Ok(fields)
}
