use crate::{render::unit::Color3, util::range::NumRange};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// High-level classification of a cell, based on its elevation
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TerrainType {
    // Water
    Ocean,
    Coast,

    // Land
    Beach,
    Grassland,
    Forest,
    Mountain,
    Snow,
}

impl TerrainType {
    pub fn is_water(self) -> bool {
        matches!(self, Self::Ocean | Self::Coast)
    }

    /// Can units walk across this terrain?
    pub fn is_navigable(self) -> bool {
        !self.is_water()
    }
}

/// One row of the elevation table. A cell whose elevation falls within
/// `[min, max)` gets this band's terrain and color.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationBand {
    pub terrain: TerrainType,
    pub min: f64,
    pub max: f64,
    pub color: Color3,
}

impl ElevationBand {
    const fn new(
        terrain: TerrainType,
        min: f64,
        max: f64,
        color: Color3,
    ) -> Self {
        Self {
            terrain,
            min,
            max,
            color,
        }
    }

    pub fn range(&self) -> NumRange<f64> {
        NumRange::new(self.min, self.max)
    }

    /// The table used when none is configured. Sea level sits at 0.1.
    pub fn default_table() -> Vec<Self> {
        use TerrainType::*;
        vec![
            Self::new(Ocean, 0.0, 0.06, Color3::new_int(26, 60, 110)),
            Self::new(Coast, 0.06, 0.1, Color3::new_int(46, 111, 167)),
            Self::new(Beach, 0.1, 0.15, Color3::new_int(217, 199, 139)),
            Self::new(Grassland, 0.15, 0.4, Color3::new_int(106, 168, 79)),
            Self::new(Forest, 0.4, 0.65, Color3::new_int(47, 107, 47)),
            Self::new(Mountain, 0.65, 0.9, Color3::new_int(125, 110, 93)),
            Self::new(Snow, 0.9, 1.0, Color3::new_int(242, 242, 242)),
        ]
    }

    /// Find the band an elevation falls in. Elevations at or above the top
    /// of the highest band belong to that band, so the maximum elevation
    /// (which no half-open band contains) is still classified.
    pub fn lookup(table: &[Self], elevation: f64) -> Option<&Self> {
        table
            .iter()
            .find(|band| band.range().contains_exclusive(elevation))
            .or_else(|| {
                table
                    .iter()
                    .filter(|band| elevation >= band.max)
                    .max_by(|a, b| a.max.total_cmp(&b.max))
            })
    }
}
