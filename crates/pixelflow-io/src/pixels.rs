//! Site types from decoded RGB pixels.
//!
//! Codes follow the standard table order: 0 air, 1 wall, 2 water,
//! 3 source.

use pixelflow_core::{ConfigError, Grid, SiteTypeId};

const BRIGHT: u8 = 240;
const MUTED: u8 = 160;

/// Site type code for one `[r, g, b]` pixel.
///
/// Any pixel darker than near-white in every channel is a wall; a strong
/// red is a source and a strong blue is water; everything else is air.
pub fn classify_pixel([r, g, b]: [u8; 3]) -> u32 {
    if r < BRIGHT && g < BRIGHT && b < BRIGHT {
        1
    } else if r > BRIGHT && g < MUTED && b < MUTED {
        3
    } else if b > BRIGHT && r < MUTED && g < MUTED {
        2
    } else {
        0
    }
}

/// Type matrix from a row-major `width × height` pixel buffer.
///
/// # Errors
///
/// [`ConfigError::InvalidDimensions`] if either dimension is zero,
/// [`ConfigError::ShapeMismatch`] if the buffer does not hold exactly
/// `width × height` pixels.
pub fn grid_from_pixels(
    width: usize,
    height: usize,
    pixels: &[[u8; 3]],
) -> Result<Grid<SiteTypeId>, ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidDimensions {
            rows: height,
            cols: width,
        });
    }
    let cells = pixels
        .iter()
        .map(|&pixel| SiteTypeId(classify_pixel(pixel)))
        .collect();
    Grid::from_vec(height, width, cells)
}
