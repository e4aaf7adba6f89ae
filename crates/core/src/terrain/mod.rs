//! Terrain generation. Generators assign each cell of a grid an elevation,
//! then each cell is colored, and marked crossable or not, according to the
//! elevation table.
//!
//! Generators don't care what kind of grid they run on. Anything that
//! implements [ElevationTarget] will do: a [Hexasphere], or a plain triangle
//! mesh wrapped in [MeshCells].

mod cells;
mod elevation;
mod heightmap;
mod planar;
pub mod plates;

pub use cells::MeshCells;
pub use elevation::{ElevationBand, TerrainType};
pub use heightmap::{
    apply_color_map, apply_height_map, ColorMap, HeightMap, HeightMapOptions,
};

use crate::{
    config::{TerrainConfig, TerrainGenerator},
    render::unit::Color3,
    sphere::Hexasphere,
    terrain::{planar::PlanarGenerator, plates::PlateGenerator},
    timed,
    util::range::NumRange,
};
use anyhow::{ensure, Context};
use log::info;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::fmt::Debug;
use validator::Validate;

/// A set of addressable cells that terrain can be applied to. Cells are
/// indexed `0..cell_count()`, and each one has a position, neighbours, and
/// an elevation in `[0, 1]`.
pub trait ElevationTarget {
    fn cell_count(&self) -> usize;

    /// Position of the cell, relative to the center of the body it's on
    fn cell_position(&self, cell: usize) -> Vector3<f64>;

    fn cell_neighbours(&self, cell: usize) -> &[usize];

    fn elevation(&self, cell: usize) -> f64;

    /// Set the elevation of a cell. Implementations clamp to `[0, 1]`.
    fn set_elevation(&mut self, cell: usize, elevation: f64);

    fn set_color(&mut self, cell: usize, color: Color3);

    fn set_can_cross(&mut self, cell: usize, can_cross: bool);
}

impl ElevationTarget for Hexasphere {
    fn cell_count(&self) -> usize {
        self.tile_count()
    }

    fn cell_position(&self, cell: usize) -> Vector3<f64> {
        self.tiles()[cell].center()
    }

    fn cell_neighbours(&self, cell: usize) -> &[usize] {
        self.tiles()[cell].neighbours()
    }

    fn elevation(&self, cell: usize) -> f64 {
        self.tiles()[cell].extrude_amount()
    }

    fn set_elevation(&mut self, cell: usize, elevation: f64) {
        self.set_tile_extrude_amount(cell, elevation);
    }

    fn set_color(&mut self, cell: usize, color: Color3) {
        self.set_tile_color(cell, color, false);
    }

    fn set_can_cross(&mut self, cell: usize, can_cross: bool) {
        self.set_tile_can_cross(cell, can_cross);
    }
}

/// A container for one terrain generation pass. These fields are public to
/// allow for disjoint borrowing of multiple fields at once.
pub struct TerrainBuilder<'a, T: ElevationTarget + ?Sized> {
    /// Please **do not mutate the config**
    pub config: &'a TerrainConfig,
    pub rng: Pcg64,
    pub target: &'a mut T,
}

impl<'a, T: ElevationTarget + ?Sized> TerrainBuilder<'a, T> {
    pub fn new(config: &'a TerrainConfig, target: &'a mut T) -> Self {
        Self {
            config,
            rng: Pcg64::seed_from_u64(config.seed.to_u64()),
            target,
        }
    }

    /// Run the configured generator, then paint the cells from the
    /// elevation table
    pub fn generate(&mut self) -> anyhow::Result<()> {
        match &self.config.generator {
            TerrainGenerator::TectonicPlates(config) => {
                self.apply_generator(PlateGenerator(*config))?
            }
            TerrainGenerator::PlanarBisecting(config) => {
                self.apply_generator(PlanarGenerator(*config))?
            }
        }
        self.apply_generator(TerrainPainter)
    }

    fn apply_generator(
        &mut self,
        generator: impl Debug + Generate,
    ) -> anyhow::Result<()> {
        timed!(&format!("{:?}", generator), generator.generate(self))
            .with_context(|| format!("error in {:?}", generator))
    }
}

/// One step of terrain generation. A step can change the state of any
/// cell, but never adds or removes cells.
trait Generate {
    fn generate<T: ElevationTarget + ?Sized>(
        &self,
        builder: &mut TerrainBuilder<T>,
    ) -> anyhow::Result<()>;
}

/// Colors every cell, and decides whether it can be crossed, from its
/// elevation
#[derive(Debug)]
struct TerrainPainter;

impl Generate for TerrainPainter {
    fn generate<T: ElevationTarget + ?Sized>(
        &self,
        builder: &mut TerrainBuilder<T>,
    ) -> anyhow::Result<()> {
        let table = &builder.config.elevations;
        // Resolve every band before touching any cell, so a bad table can't
        // leave the grid half painted
        let bands = (0..builder.target.cell_count())
            .map(|cell| {
                let elevation = builder.target.elevation(cell);
                ElevationBand::lookup(table, elevation).with_context(|| {
                    format!(
                        "no elevation band for {} (cell {})",
                        elevation, cell
                    )
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        for (cell, band) in bands.into_iter().enumerate() {
            builder.target.set_color(cell, band.color);
            builder
                .target
                .set_can_cross(cell, band.terrain.is_navigable());
        }
        Ok(())
    }
}

/// Check the parts of a terrain config that field validation can't
fn validate_config(config: &TerrainConfig) -> anyhow::Result<()> {
    config.validate()?;
    config.generator.validate()?;
    ensure!(!config.elevations.is_empty(), "elevation table is empty");
    let normal = NumRange::normal_range();
    for band in &config.elevations {
        ensure!(
            band.min < band.max,
            "elevation band {} has min {} >= max {}",
            band.terrain,
            band.min,
            band.max
        );
        ensure!(
            normal.contains(band.min) && normal.contains(band.max),
            "elevation band {} {} is outside {}",
            band.terrain,
            band.range(),
            normal
        );
    }

    // Every elevation in [0, 1] has to land in some band
    let mut bands: Vec<&ElevationBand> = config.elevations.iter().collect();
    bands.sort_by(|a, b| a.min.total_cmp(&b.min));
    let mut covered = 0.0;
    for band in bands {
        ensure!(
            band.min <= covered,
            "elevation table has a gap between {} and {}",
            covered,
            band.min
        );
        covered = f64::max(covered, band.max);
    }
    ensure!(
        covered >= 1.0,
        "elevation table stops at {}, short of 1",
        covered
    );
    Ok(())
}

/// Generate terrain on a grid, overwriting the elevation, color and
/// crossability of every cell. Two runs with the same config on the same
/// grid give the same result.
pub fn apply_terrain<T: ElevationTarget + ?Sized>(
    target: &mut T,
    config: &TerrainConfig,
) -> anyhow::Result<()> {
    validate_config(config).context("invalid terrain config")?;
    info!(
        "Generating terrain for {} cells with {:?}",
        target.cell_count(),
        config.generator
    );
    timed!(
        "Terrain generation",
        log::Level::Info,
        TerrainBuilder::new(config, target).generate()
    )
}

impl Hexasphere {
    /// Shorthand for [apply_terrain] on this sphere
    pub fn apply_terrain(
        &mut self,
        config: &TerrainConfig,
    ) -> anyhow::Result<()> {
        apply_terrain(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PlanarConfig, HexasphereConfig};

    fn sphere() -> Hexasphere {
        Hexasphere::generate(HexasphereConfig {
            divisions: 4,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_painted_from_table() {
        let mut sphere = sphere();
        let config = TerrainConfig::default();
        sphere.apply_terrain(&config).unwrap();

        for tile in sphere.tiles() {
            let band =
                ElevationBand::lookup(&config.elevations, tile.extrude_amount())
                    .unwrap();
            assert_eq!(tile.fill().color, Some(band.color));
            assert_eq!(tile.can_cross(), band.terrain.is_navigable());
        }
    }

    #[test]
    fn test_deterministic() {
        let config = TerrainConfig {
            seed: "islands".into(),
            ..Default::default()
        };
        let mut a = sphere();
        let mut b = sphere();
        a.apply_terrain(&config).unwrap();
        b.apply_terrain(&config).unwrap();
        for (a, b) in a.tiles().iter().zip(b.tiles()) {
            assert_eq!(a.extrude_amount(), b.extrude_amount());
        }
    }

    #[test]
    fn test_invalid_table() {
        let mut sphere = sphere();
        let mut config = TerrainConfig {
            elevations: Vec::new(),
            ..Default::default()
        };
        assert!(sphere.apply_terrain(&config).is_err());

        config.elevations = ElevationBand::default_table();
        config.elevations[2].max = config.elevations[2].min;
        assert!(sphere.apply_terrain(&config).is_err());
    }

    #[test]
    fn test_gap_in_table() {
        let mut sphere = sphere();
        sphere.apply_terrain(&TerrainConfig::default()).unwrap();
        let before: Vec<_> = sphere
            .tiles()
            .iter()
            .map(|tile| (tile.extrude_amount(), tile.fill().color))
            .collect();

        let planar = TerrainGenerator::PlanarBisecting(PlanarConfig {
            default_extrusion: 0.9,
            raise_amount: 0.0,
            iterations: 1,
        });
        let mut table = ElevationBand::default_table();
        // Doesn't start at 0
        table[0].min = 0.02;
        let bad_tables = vec![
            table,
            // Only covers the bottom half
            ElevationBand::default_table()
                .into_iter()
                .filter(|band| band.max <= 0.4)
                .collect(),
            // Missing a band in the middle
            ElevationBand::default_table()
                .into_iter()
                .filter(|band| band.terrain != TerrainType::Forest)
                .collect(),
        ];
        for elevations in bad_tables {
            let config = TerrainConfig {
                elevations,
                generator: planar.clone(),
                ..Default::default()
            };
            assert!(sphere.apply_terrain(&config).is_err());
            // Nothing was written
            let after: Vec<_> = sphere
                .tiles()
                .iter()
                .map(|tile| (tile.extrude_amount(), tile.fill().color))
                .collect();
            assert_eq!(after, before);
        }
    }
}
