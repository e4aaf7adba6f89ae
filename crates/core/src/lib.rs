//! Hexasphere is a geodesic tile grid on a sphere: hexagons everywhere,
//! plus the 12 pentagons that geometry demands. This crate contains the
//! grid itself, display buffers for it, and the queries a game needs to
//! play on it (picking, pathfinding, terrain). Presentation layers are
//! implemented elsewhere.
//!
//! ```
//! use hexasphere::{Hexasphere, HexasphereConfig, ALL_GROUPS};
//!
//! let config = HexasphereConfig {
//!     divisions: 4,
//!     ..Default::default()
//! };
//! let mut sphere = Hexasphere::generate(config).unwrap();
//! assert_eq!(sphere.tile_count(), 162);
//!
//! let goal = sphere.polar_opposite_tile(0).unwrap();
//! let path = sphere.find_path(0, goal, 0, ALL_GROUPS).unwrap();
//! println!("{} steps to the other side", path.len());
//! ```
//!
//! See [HexasphereConfig] for details on how generation can be customized,
//! and [TerrainConfig] for terrain.

mod config;
pub mod render;
pub mod sphere;
pub mod terrain;
mod util;

pub use crate::{
    config::{
        HeuristicFormula, HexasphereConfig, PathfindingConfig, PlanarConfig,
        PlateConfig, Seed, Style, TerrainConfig, TerrainGenerator,
    },
    render::{
        unit::Color3, ChunkUpdate, HexasphereMesh, MeshChunk, MeshLayer,
        MeshSpan, Topology,
    },
    sphere::{
        event::{PointerTracker, TileEvent},
        locate::{Ray, TileLocator},
        paint::ClearTile,
        path::{PathCost, ALL_GROUPS},
        persist::{TileSave, TileSaveData},
        tile::{Tile, TileFill, DEFAULT_GROUP},
        Hexasphere,
    },
    terrain::{ElevationBand, ElevationTarget, TerrainType},
    util::{range::NumRange, tile_count},
};
