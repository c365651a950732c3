//! The stock site type table.
//!
//! Registered in grid-file code order, so code `n` in a grid file or a
//! pixel classification is the `n`-th type below.

use crate::error::ConfigError;
use crate::site_type::{Color, SiteType};

/// Lossless, fully transmitting medium. Code 0, the usual default.
pub const AIR: &str = "Air";
/// Perfect reflector. Code 1.
pub const WALL: &str = "Wall";
/// Lossy medium that warms up. Code 2.
pub const WATER: &str = "Water";
/// 24.5 Hz oscillator with amplitude 40. Code 3.
pub const SOURCE: &str = "Source";

/// Air, Wall, Water, Source.
pub fn standard_site_types() -> Result<Vec<SiteType>, ConfigError> {
    Ok(vec![
        SiteType::obstacle(AIR, Color::WHITE, 1.0, 0.0, f32::MAX)?,
        SiteType::obstacle(WALL, Color::DARK_GRAY, 0.0, 1.0, f32::MAX)?,
        SiteType::obstacle(WATER, Color::BLUE, 0.93, 0.0, 4.2)?,
        SiteType::source(SOURCE, Color::MAGENTA, 24.5, 40.0)?,
    ])
}
