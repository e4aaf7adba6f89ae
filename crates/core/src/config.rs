mod seed;

pub use seed::Seed;

use crate::{render::unit::Color3, terrain::ElevationBand};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// Configuration that defines a hexasphere. Two spheres generated with the
/// same config always have identical topology and tile indices.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HexasphereConfig {
    /// Number of times each edge of the 20 icosahedron faces is divided. The
    /// sphere will have `10n² + 2` tiles.
    #[validate(range(min = 2, max = 1024))]
    pub divisions: u32,

    /// Euler angles, **in degrees**, applied to the 12 icosahedron corners
    /// before subdivision: roll about X, pitch about Y, yaw about Z. Useful
    /// to move the pentagons away from places where they'd be noticed.
    pub rotation: [f64; 3],

    /// Which buffers to build for display
    pub style: Style,

    /// Should tiles be displaced radially by their extrude amount? When
    /// disabled, all tiles are drawn on the base sphere and extrusion only
    /// affects queries.
    pub extruded: bool,

    /// Build the shaded mesh facing inward, for viewing the sphere from the
    /// inside. Inverted spheres are never extruded.
    pub inverted: bool,

    /// Radial scale of extrusion. A tile with extrude amount `e` has its top
    /// at radius `1 + e * extrude_multiplier`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub extrude_multiplier: f64,

    /// Color of shaded tiles that haven't been given a custom color
    pub default_shaded_color: Color3,

    /// In extruded wireframe mode, color each tile's outline with the tile's
    /// own fill color rather than white
    pub wireframe_color_from_tile: bool,

    /// Hard ceiling on the number of vertices in a single mesh chunk. Most
    /// graphics APIs are happiest below 65536 with 16-bit indices.
    #[validate(range(min = 8, max = 65535))]
    pub max_vertices_per_chunk: u32,

    #[validate]
    pub pathfinding: PathfindingConfig,
}

/// Config for tile pathfinding
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PathfindingConfig {
    pub heuristic: HeuristicFormula,

    /// Maximum number of steps in a path, used when a query passes a limit of
    /// zero
    #[validate(range(min = 1))]
    pub search_limit: u32,
}

/// The buffers that get built for display
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Style {
    Wireframe,
    Shaded,
    ShadedWireframe,
}

impl Style {
    pub fn has_shaded(self) -> bool {
        matches!(self, Self::Shaded | Self::ShadedWireframe)
    }

    pub fn has_wireframe(self) -> bool {
        matches!(self, Self::Wireframe | Self::ShadedWireframe)
    }
}

/// Distance estimate used to guide pathfinding towards its goal
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HeuristicFormula {
    /// Great-circle angle between tile centers
    SphericalDistance,
    /// Straight-line distance between tile centers
    Euclidean,
    /// Squared straight-line distance. Cheaper, but it overestimates over
    /// long distances, so paths are not guaranteed to be shortest.
    EuclideanNoSqr,
}

/// Configuration for a terrain generation pass over a grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: Seed,

    /// Elevations at or below this are water
    #[validate(range(min = 0.0, max = 1.0))]
    pub sea_level: f64,

    /// Elevation to terrain mapping, used to color cells and decide whether
    /// they can be crossed. Bands must cover [0, 1] without gaps.
    pub elevations: Vec<ElevationBand>,

    pub generator: TerrainGenerator,
}

/// The algorithm used to assign elevations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainGenerator {
    TectonicPlates(PlateConfig),
    PlanarBisecting(PlanarConfig),
}

/// Knobs for the tectonic plate simulation
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlateConfig {
    #[validate(range(min = 1, max = 10000))]
    pub plate_count: u32,

    /// Probability that a plate is water rather than land
    #[validate(range(min = 0.0, max = 1.0))]
    pub water_chance: f64,

    /// Gap kept between sea level and the elevation bands of plates, so water
    /// plates sit clearly below it and land plates clearly above
    #[validate(range(min = 0.0, max = 0.5))]
    pub land_buffer: f64,

    /// Probability that a frontier tile is pushed back onto its plate's queue
    /// instead of being claimed. Zero gives plain breadth-first growth.
    #[validate(range(min = 0.0, max = 0.99))]
    pub chance_of_fill_requeue: f64,

    /// Growth gives up after this many rounds, even if tiles remain
    #[validate(range(min = 1))]
    pub max_rounds: u32,

    /// Edge tiles whose outward direction is within this angle (degrees) of
    /// their plate's pressure direction are pressure edges
    #[validate(range(min = 0.0, max = 180.0))]
    pub pressure_angle: f64,

    /// Extra elevation added where two land plates collide
    #[validate(range(min = 0.0, max = 1.0))]
    pub mountain_height: f64,

    /// Chance that a water/water pressure edge tile becomes an island
    #[validate(range(min = 0.0, max = 1.0))]
    pub fault_island_chance: f64,

    /// Shoreline tiles of water plates are raised to this far below sea
    /// level
    #[validate(range(min = 0.0, max = 1.0))]
    pub shoreline_depth: f64,
}

/// Knobs for planar bisection terrain
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlanarConfig {
    /// Starting elevation of every cell
    #[validate(range(min = 0.0, max = 1.0))]
    pub default_extrusion: f64,

    /// Amount each cut raises (or lowers) each side
    #[validate(range(min = 0.0, max = 1.0))]
    pub raise_amount: f64,

    #[validate(range(min = 1, max = 100000))]
    pub iterations: u32,
}

impl Default for HexasphereConfig {
    fn default() -> Self {
        Self {
            divisions: 8,
            rotation: [0.0, 0.0, 0.0],
            style: Style::ShadedWireframe,
            extruded: false,
            inverted: false,
            extrude_multiplier: 0.05,
            default_shaded_color: Color3::new(0.56, 0.71, 0.54),
            wireframe_color_from_tile: false,
            max_vertices_per_chunk: 65500,
            pathfinding: PathfindingConfig::default(),
        }
    }
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            heuristic: HeuristicFormula::SphericalDistance,
            search_limit: 2000,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: Seed::default(),
            sea_level: 0.1,
            elevations: ElevationBand::default_table(),
            generator: TerrainGenerator::TectonicPlates(PlateConfig::default()),
        }
    }
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            plate_count: 10,
            water_chance: 0.5,
            land_buffer: 0.05,
            chance_of_fill_requeue: 0.3,
            max_rounds: 500,
            pressure_angle: 45.0,
            mountain_height: 0.3,
            fault_island_chance: 0.1,
            shoreline_depth: 0.02,
        }
    }
}

impl Default for PlanarConfig {
    fn default() -> Self {
        Self {
            default_extrusion: 0.3,
            raise_amount: 0.1,
            iterations: 10,
        }
    }
}

impl TerrainGenerator {
    /// Validate the config of whichever generator is selected
    pub fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            Self::TectonicPlates(config) => config.validate(),
            Self::PlanarBisecting(config) => config.validate(),
        }
    }
}
