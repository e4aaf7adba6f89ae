//! Cosmetic and gameplay state of individual tiles. Every setter that
//! touches something drawn patches the mesh in place and marks the owning
//! chunk dirty, to be picked up by [Hexasphere::flush_mesh_updates].

use crate::{
    render::{unit::Color3, ChunkUpdate},
    sphere::{
        tile::{TileFill, DEFAULT_GROUP},
        Hexasphere,
    },
    util::range::NumRange,
};
use serde::{Deserialize, Serialize};

/// Which parts of a tile's state to reset with [Hexasphere::clear_tile]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearTile {
    /// Every clear drops the temporary color, whatever this is set to
    pub temporary_color: bool,
    /// Reset the fill (color and texture) to the sphere default
    pub colors: bool,
    /// Make the tile crossable again
    pub obstacles: bool,
}

impl Default for ClearTile {
    fn default() -> Self {
        Self {
            temporary_color: false,
            colors: true,
            obstacles: true,
        }
    }
}

impl Hexasphere {
    /// Paint a tile. Temporary colors are only tracked in tile state, they
    /// never reach the mesh and are never saved.
    pub fn set_tile_color(
        &mut self,
        index: usize,
        color: Color3,
        temporary: bool,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) if temporary => {
                tile.temporary_fill = Some(TileFill {
                    color: Some(color),
                    ..tile.fill
                });
                true
            }
            Some(tile) => {
                tile.fill.color = Some(color);
                self.mesh.patch_colors(tile, &self.config);
                true
            }
            None => false,
        }
    }

    /// Get the color a tile is shown with. Unless `ignore_temporary` is set,
    /// a temporary override wins over the tile's own fill.
    pub fn tile_color(
        &self,
        index: usize,
        ignore_temporary: bool,
    ) -> Option<Color3> {
        let tile = self.tiles.get(index)?;
        let fill = match tile.temporary_fill {
            Some(fill) if !ignore_temporary => fill,
            _ => tile.fill,
        };
        Some(match fill.color {
            Some(color) => color,
            None if fill.texture_index != 0 => Color3::WHITE,
            None => self.config.default_shaded_color,
        })
    }

    pub fn clear_temporary_color(&mut self, index: usize) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.temporary_fill = None;
                true
            }
            None => false,
        }
    }

    /// Texture a tile. Index 0 means untextured. The tint is multiplied with
    /// the texture, so white leaves it unaltered.
    pub fn set_tile_texture(
        &mut self,
        index: usize,
        texture_index: u32,
        tint: Color3,
        temporary: bool,
    ) -> bool {
        let fill = TileFill {
            color: Some(tint),
            texture_index,
        };
        match self.tiles.get_mut(index) {
            Some(tile) if temporary => {
                tile.temporary_fill = Some(fill);
                true
            }
            Some(tile) => {
                tile.fill = fill;
                self.mesh.patch_uvs(tile, &self.config);
                self.mesh.patch_colors(tile, &self.config);
                true
            }
            None => false,
        }
    }

    pub fn tile_texture(&self, index: usize) -> Option<u32> {
        self.tiles.get(index).map(|tile| tile.fill.texture_index)
    }

    /// Rotate a tile's texture around the tile center
    pub fn set_tile_texture_rotation(
        &mut self,
        index: usize,
        radians: f32,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.texture_rotation = radians;
                self.mesh.patch_uvs(tile, &self.config);
                true
            }
            None => false,
        }
    }

    pub fn tile_texture_rotation(&self, index: usize) -> Option<f32> {
        self.tiles.get(index).map(|tile| tile.texture_rotation)
    }

    /// Set how far a tile sticks out of the sphere, clamped to `[0, 1]`.
    /// The mesh stores this in the UVs and the shader applies it.
    pub fn set_tile_extrude_amount(
        &mut self,
        index: usize,
        amount: f64,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.extrude_amount = NumRange::normal_range().clamp(amount);
                self.mesh.patch_uvs(tile, &self.config);
                true
            }
            None => false,
        }
    }

    /// Returns `false` if any index was out of range. The valid ones are
    /// still updated.
    pub fn set_tiles_extrude_amount(
        &mut self,
        indices: &[usize],
        amount: f64,
    ) -> bool {
        indices.iter().fold(true, |all_valid, &index| {
            self.set_tile_extrude_amount(index, amount) && all_valid
        })
    }

    pub fn set_all_tiles_extrude_amount(&mut self, amount: f64) {
        for index in 0..self.tiles.len() {
            self.set_tile_extrude_amount(index, amount);
        }
    }

    pub fn tile_extrude_amount(&self, index: usize) -> Option<f64> {
        self.tiles.get(index).map(|tile| tile.extrude_amount)
    }

    pub fn set_tile_can_cross(
        &mut self,
        index: usize,
        can_cross: bool,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.can_cross = can_cross;
                true
            }
            None => false,
        }
    }

    pub fn tile_can_cross(&self, index: usize) -> Option<bool> {
        self.tiles.get(index).map(|tile| tile.can_cross)
    }

    /// Set the group bitmask of a tile, which path queries filter on
    pub fn set_tile_group(&mut self, index: usize, group: u32) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.group = group;
                true
            }
            None => false,
        }
    }

    pub fn tile_group(&self, index: usize) -> Option<u32> {
        self.tiles.get(index).map(|tile| tile.group)
    }

    pub fn set_tile_tag(
        &mut self,
        index: usize,
        tag: impl Into<String>,
    ) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                let tag = tag.into();
                tile.tag = if tag.is_empty() { None } else { Some(tag) };
                true
            }
            None => false,
        }
    }

    pub fn tile_tag(&self, index: usize) -> Option<&str> {
        self.tiles.get(index)?.tag.as_deref()
    }

    pub fn set_tile_tag_int(&mut self, index: usize, tag: i32) -> bool {
        match self.tiles.get_mut(index) {
            Some(tile) => {
                tile.tag_int = tag;
                true
            }
            None => false,
        }
    }

    pub fn tile_tag_int(&self, index: usize) -> Option<i32> {
        self.tiles.get(index).map(|tile| tile.tag_int)
    }

    /// Find the first tile with the given tag
    pub fn tile_with_tag(&self, tag: &str) -> Option<usize> {
        self.tiles
            .iter()
            .position(|tile| tile.tag.as_deref() == Some(tag))
    }

    /// Find the first tile with the given int tag
    pub fn tile_with_tag_int(&self, tag: i32) -> Option<usize> {
        self.tiles.iter().position(|tile| tile.tag_int == tag)
    }

    /// Reset parts of a tile's state. The temporary color is always
    /// dropped. Group and tags are left alone.
    pub fn clear_tile(&mut self, index: usize, clear: ClearTile) -> bool {
        let tile = match self.tiles.get_mut(index) {
            Some(tile) => tile,
            None => return false,
        };
        tile.temporary_fill = None;
        if clear.obstacles {
            tile.can_cross = true;
        }
        if clear.colors && tile.fill.is_custom() {
            tile.fill = TileFill::default();
            self.mesh.patch_uvs(tile, &self.config);
            self.mesh.patch_colors(tile, &self.config);
        }
        true
    }

    /// [Self::clear_tile] for every tile
    pub fn clear_tiles(&mut self, clear: ClearTile) {
        for index in 0..self.tiles.len() {
            self.clear_tile(index, clear);
        }
    }

    /// Get every chunk that was patched since the last flush, so the caller
    /// can re-upload those buffers. Clears the dirty flags.
    pub fn flush_mesh_updates(&mut self) -> Vec<ChunkUpdate> {
        self.mesh.take_updates()
    }

    /// Put a tile back in the default group
    pub fn reset_tile_group(&mut self, index: usize) -> bool {
        self.set_tile_group(index, DEFAULT_GROUP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::MeshLayer, HexasphereConfig};

    fn sphere() -> Hexasphere {
        Hexasphere::generate(HexasphereConfig {
            divisions: 4,
            max_vertices_per_chunk: 300,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_bad_index_is_noop() {
        let mut sphere = sphere();
        assert!(!sphere.set_tile_color(10_000, Color3::BLACK, false));
        assert!(!sphere.set_tile_extrude_amount(10_000, 0.5));
        assert!(!sphere.set_tile_tag(10_000, "x"));
        assert_eq!(sphere.tile_color(10_000, false), None);
        assert_eq!(sphere.tile_tag(10_000), None);
        assert!(sphere.flush_mesh_updates().is_empty());
    }

    #[test]
    fn test_temporary_color() {
        let mut sphere = sphere();
        let red = Color3::new(1.0, 0.0, 0.0);
        let default = sphere.config().default_shaded_color;

        assert!(sphere.set_tile_color(20, red, true));
        assert_eq!(sphere.tile_color(20, false), Some(red));
        assert_eq!(sphere.tile_color(20, true), Some(default));
        // Never baked into the mesh
        assert!(sphere.flush_mesh_updates().is_empty());

        sphere.clear_temporary_color(20);
        assert_eq!(sphere.tile_color(20, false), Some(default));
    }

    #[test]
    fn test_color_patches_chunk() {
        let mut sphere = sphere();
        let red = Color3::new(1.0, 0.0, 0.0);
        sphere.set_tile_color(100, red, false);

        let span = sphere.tile(100).unwrap().shaded_span().unwrap();
        let chunk = &sphere.mesh().shaded()[span.chunk];
        assert_eq!(chunk.colors()[span.start], red.to_rgba());

        let updates = sphere.flush_mesh_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].layer, MeshLayer::Shaded);
        assert_eq!(updates[0].chunk, span.chunk);
        assert!(updates[0].colors);
        assert!(!updates[0].uvs);
        assert!(sphere.flush_mesh_updates().is_empty());
    }

    #[test]
    fn test_extrude_amount_clamped() {
        let mut sphere = sphere();
        sphere.set_tile_extrude_amount(3, 4.0);
        assert_eq!(sphere.tile_extrude_amount(3), Some(1.0));
        sphere.set_tile_extrude_amount(3, -1.0);
        assert_eq!(sphere.tile_extrude_amount(3), Some(0.0));

        assert!(!sphere.set_tiles_extrude_amount(&[1, 2, 99_999], 0.5));
        assert_eq!(sphere.tile_extrude_amount(1), Some(0.5));
        assert_eq!(sphere.tile_extrude_amount(2), Some(0.5));

        sphere.set_all_tiles_extrude_amount(0.25);
        assert!(sphere.tiles().iter().all(|t| t.extrude_amount() == 0.25));
    }

    #[test]
    fn test_tags() {
        let mut sphere = sphere();
        sphere.set_tile_tag(40, "capital");
        sphere.set_tile_tag_int(41, 7);
        assert_eq!(sphere.tile_with_tag("capital"), Some(40));
        assert_eq!(sphere.tile_with_tag("nowhere"), None);
        assert_eq!(sphere.tile_with_tag_int(7), Some(41));
        assert_eq!(sphere.tile_tag(40), Some("capital"));

        sphere.set_tile_tag(40, "");
        assert_eq!(sphere.tile_tag(40), None);
    }

    #[test]
    fn test_clear_tile() {
        let mut sphere = sphere();
        sphere.set_tile_texture(5, 3, Color3::WHITE, false);
        sphere.set_tile_can_cross(5, false);
        sphere.set_tile_color(5, Color3::BLACK, true);
        sphere.set_tile_group(5, 4);

        sphere.clear_tile(5, ClearTile::default());
        assert_eq!(sphere.tile_texture(5), Some(0));
        assert_eq!(sphere.tile_can_cross(5), Some(true));
        assert_eq!(
            sphere.tile_color(5, false),
            Some(sphere.config().default_shaded_color)
        );
        // Group survives the clear
        assert_eq!(sphere.tile_group(5), Some(4));

        // Even a clear that keeps colors and obstacles drops the temporary
        // color
        let red = Color3::new(1.0, 0.0, 0.0);
        sphere.set_tile_color(5, red, false);
        sphere.set_tile_color(5, Color3::BLACK, true);
        sphere.set_tile_can_cross(5, false);
        sphere.clear_tiles(ClearTile {
            temporary_color: false,
            colors: false,
            obstacles: false,
        });
        assert_eq!(sphere.tile_color(5, false), Some(red));
        assert_eq!(sphere.tile_can_cross(5), Some(false));
        assert!(sphere.reset_tile_group(5));
        assert_eq!(sphere.tile_group(5), Some(DEFAULT_GROUP));
    }
}
