pub mod event;
pub mod geodesic;
pub mod locate;
pub mod paint;
pub mod path;
pub mod persist;
mod point;
pub mod tile;

use crate::{
    config::HexasphereConfig,
    render::HexasphereMesh,
    sphere::{
        geodesic::Geodesic,
        locate::TileLocator,
        path::StepScale,
        tile::{build_tiles, Tile},
    },
    timed,
};
use anyhow::Context;
use log::{debug, info};
use nalgebra::{Point3, Similarity3, Vector3};
use validator::Validate;

/// A generated hexasphere: the tile graph, its display buffers, and the state
/// needed to answer queries about it. Everything here is owned by the
/// instance, so any number of spheres can coexist.
///
/// Tiles are addressed by index. Every method that takes a tile index treats
/// an out-of-range index as a no-op: setters return `false`, getters return
/// `None`, list queries return an empty list.
///
/// ## Coordinate spaces
/// **Local** space is centered on the sphere, with the base surface at
/// radius 1. **World** space is local space put through the sphere's
/// [transform](Self::set_transform).
#[derive(Clone, Debug)]
pub struct Hexasphere {
    config: HexasphereConfig,
    tiles: Vec<Tile>,
    mesh: HexasphereMesh,
    locator: TileLocator,
    transform: Similarity3<f64>,
    step_scale: StepScale,
}

impl Hexasphere {
    /// Generate a new hexasphere. Returns an error if the config is invalid.
    /// With an inverted config, extrusion is turned off.
    pub fn generate(mut config: HexasphereConfig) -> anyhow::Result<Self> {
        info!("Generating hexasphere with config {:#?}", config);
        config.validate().context("invalid config")?;
        if config.inverted && config.extruded {
            debug!("Inverted spheres can't be extruded, disabling extrusion");
            config.extruded = false;
        }

        let geodesic = timed!(
            "Subdivision",
            Geodesic::new(config.divisions, config.rotation)
        );
        let mut tiles = timed!("Tile graph", build_tiles(&geodesic));
        let mesh = timed!(
            "Mesh build",
            log::Level::Info,
            HexasphereMesh::build(&mut tiles, &config)
        );
        let step_scale = StepScale::measure(&tiles);

        info!(
            "Generated {} tiles into {} shaded and {} wireframe chunks",
            tiles.len(),
            mesh.shaded().len(),
            mesh.wireframe().len()
        );
        Ok(Self {
            config,
            tiles,
            mesh,
            locator: TileLocator::default(),
            transform: Similarity3::identity(),
            step_scale,
        })
    }

    /// Throw away all tiles and buffers and generate again from a new config.
    /// Tile state is reset, but the transform is kept. On error, the sphere
    /// is left untouched.
    pub fn regenerate(
        &mut self,
        config: HexasphereConfig,
    ) -> anyhow::Result<()> {
        let transform = self.transform;
        *self = Self::generate(config)?;
        self.transform = transform;
        Ok(())
    }

    /// Get the config this sphere was generated from
    pub fn config(&self) -> &HexasphereConfig {
        &self.config
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Always 12, but it's nice to be able to check
    pub fn pentagon_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_pentagon()).count()
    }

    /// Display buffers. Call [Self::flush_mesh_updates] to find out which
    /// chunks changed since the last upload.
    pub fn mesh(&self) -> &HexasphereMesh {
        &self.mesh
    }

    pub fn transform(&self) -> &Similarity3<f64> {
        &self.transform
    }

    /// Place the sphere in world space. Only affects world-space queries.
    pub fn set_transform(&mut self, transform: Similarity3<f64>) {
        self.transform = transform;
    }

    /// Radial scale of a tile's top face relative to the base sphere
    pub(crate) fn extrusion_scale(&self, tile: &Tile) -> f64 {
        if self.config.extruded {
            tile.top_scale(self.config.extrude_multiplier)
        } else {
            1.0
        }
    }

    /// Center of a tile's top face, with extrusion applied
    pub fn tile_center(
        &self,
        index: usize,
        world_space: bool,
    ) -> Option<Vector3<f64>> {
        let tile = self.tiles.get(index)?;
        let local = tile.center * self.extrusion_scale(tile);
        Some(self.to_space(local, world_space))
    }

    /// Position of one of a tile's boundary vertices, with extrusion applied
    pub fn tile_vertex(
        &self,
        index: usize,
        vertex: usize,
        world_space: bool,
    ) -> Option<Vector3<f64>> {
        let tile = self.tiles.get(index)?;
        let local = tile.vertices.get(vertex)? * self.extrusion_scale(tile);
        Some(self.to_space(local, world_space))
    }

    fn to_space(&self, local: Vector3<f64>, world_space: bool) -> Vector3<f64> {
        if world_space {
            self.transform.transform_point(&Point3::from(local)).coords
        } else {
            local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn test_inverted_disables_extrusion() {
        let sphere = Hexasphere::generate(HexasphereConfig {
            divisions: 2,
            inverted: true,
            extruded: true,
            ..Default::default()
        })
        .unwrap();
        assert!(!sphere.config().extruded);
    }

    #[test]
    fn test_tile_center_spaces() {
        let mut sphere = Hexasphere::generate(HexasphereConfig {
            divisions: 3,
            extruded: true,
            extrude_multiplier: 0.5,
            ..Default::default()
        })
        .unwrap();
        let base = sphere.tile(30).unwrap().center();
        sphere.set_tile_extrude_amount(30, 1.0);
        let local = sphere.tile_center(30, false).unwrap();
        assert_approx_eq!(local.norm(), base.norm() * 1.5);

        sphere.set_transform(Similarity3::from_parts(
            Translation3::new(10.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            2.0,
        ));
        let world = sphere.tile_center(30, true).unwrap();
        assert_approx_eq!((world - Vector3::new(10.0, 0.0, 0.0)).norm(),
            local.norm() * 2.0);
        assert!(sphere.tile_center(5000, true).is_none());
        assert!(sphere.tile_vertex(30, 6, false).is_none());
    }

    #[test]
    fn test_regenerate_keeps_transform() {
        let mut sphere = Hexasphere::generate(HexasphereConfig {
            divisions: 2,
            ..Default::default()
        })
        .unwrap();
        let transform = Similarity3::from_scaling(3.0);
        sphere.set_transform(transform);
        sphere
            .regenerate(HexasphereConfig {
                divisions: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(sphere.tile_count(), 92);
        assert_eq!(sphere.transform(), &transform);
    }
}
