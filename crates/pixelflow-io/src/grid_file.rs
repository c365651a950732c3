//! Grid configuration files.
//!
//! A grid file stores only site types, as indices into the registry in
//! registration order. Flows and temperatures are not persisted.

use std::io::{BufRead, Write};

use log::info;
use pixelflow_core::{Grid, SiteTypeId};
use pixelflow_engine::PartitionManager;

use crate::error::GridIoError;
use crate::CELL_SEPARATOR;

/// Parse a grid configuration.
///
/// Blank lines are skipped; surrounding whitespace on a line or cell is
/// ignored. Type indices are not checked against any registry here.
///
/// # Errors
///
/// [`GridIoError::MalformedHeader`] for a missing or unparsable header or
/// a zero dimension, [`GridIoError::MalformedCell`],
/// [`GridIoError::ColumnCountMismatch`] and
/// [`GridIoError::RowCountMismatch`] for a body that disagrees with it.
pub fn read_grid_config<R: BufRead>(reader: R) -> Result<Grid<SiteTypeId>, GridIoError> {
    let mut lines = reader.lines();

    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => {
                return Err(GridIoError::MalformedHeader {
                    line: String::new(),
                })
            }
        }
    };
    let (rows, cols) = parse_header(&header)?;

    let mut cells = Vec::with_capacity(rows * cols);
    let mut row = 0;
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if row == rows {
            return Err(GridIoError::RowCountMismatch {
                expected: rows,
                got: row + 1,
            });
        }
        let before = cells.len();
        for (col, value) in line.split(CELL_SEPARATOR).enumerate() {
            let value = value.trim();
            let index = value.parse::<u32>().map_err(|_| GridIoError::MalformedCell {
                row,
                col,
                value: value.to_string(),
            })?;
            cells.push(SiteTypeId(index));
        }
        let got = cells.len() - before;
        if got != cols {
            return Err(GridIoError::ColumnCountMismatch {
                row,
                expected: cols,
                got,
            });
        }
        row += 1;
    }
    if row != rows {
        return Err(GridIoError::RowCountMismatch {
            expected: rows,
            got: row,
        });
    }

    Ok(Grid::from_vec(rows, cols, cells)?)
}

fn parse_header(line: &str) -> Result<(usize, usize), GridIoError> {
    let malformed = || GridIoError::MalformedHeader {
        line: line.to_string(),
    };
    let mut parts = line.split(CELL_SEPARATOR).map(str::trim);
    let rows = parts.next().and_then(|s| s.parse::<usize>().ok());
    let cols = parts.next().and_then(|s| s.parse::<usize>().ok());
    match (rows, cols, parts.next()) {
        (Some(rows), Some(cols), None) if rows > 0 && cols > 0 => Ok((rows, cols)),
        _ => Err(malformed()),
    }
}

/// Write a type matrix in grid configuration format.
pub fn write_grid_config<W: Write>(
    mut writer: W,
    types: &Grid<SiteTypeId>,
) -> Result<(), GridIoError> {
    writeln!(writer, "{}{CELL_SEPARATOR}{}", types.rows(), types.cols())?;
    for row in types.as_slice().chunks(types.cols()) {
        let line = row
            .iter()
            .map(|id| id.0.to_string())
            .collect::<Vec<_>>()
            .join(&CELL_SEPARATOR.to_string());
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Replace the manager's grid with the one in `reader`.
///
/// The grid is re-tiled to the file's dimensions with every site reset,
/// then every site type is set from the file. The file is parsed and
/// checked against the registry before the manager is touched.
///
/// # Errors
///
/// Any parse error from [`read_grid_config`]; [`GridIoError::Config`] if
/// the file names an unregistered type or its dimensions cannot be tiled
/// by the manager's partition grid.
pub fn load_grid_config<R: BufRead>(
    manager: &mut PartitionManager,
    reader: R,
) -> Result<(), GridIoError> {
    let types = read_grid_config(reader)?;
    for id in types.as_slice() {
        manager.registry().check(*id)?;
    }
    manager.reinitialize_sites(types.rows(), types.cols(), false)?;
    manager.set_all_site_types(&types)?;
    info!("loaded {}x{} grid configuration", types.rows(), types.cols());
    Ok(())
}

/// Write the manager's current site types in grid configuration format.
pub fn save_grid_config<W: Write>(
    manager: &PartitionManager,
    writer: W,
) -> Result<(), GridIoError> {
    write_grid_config(writer, &manager.all_site_types())
}
