use crate::{render::unit::Color3, sphere::Hexasphere};
#[cfg(any(feature = "json", feature = "bin"))]
use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};

/// Saved state for one tile. Only user-visible state is kept: geometry is
/// re-derived by generating a sphere from the same config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSaveData {
    pub tile_index: usize,
    pub color: Option<Color3>,
    #[serde(default)]
    pub texture_index: u32,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub tag_int: i32,
}

/// A set of saved tiles, along with the tile count of the sphere they came
/// from.
///
/// ## Serialization
/// Saves can be exported as JSON via [TileSave::to_json] (requires the
/// `json` feature), or as [CBOR](https://cbor.io/) via [TileSave::to_bin]
/// (requires the `bin` feature).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileSave {
    pub tile_count: usize,
    pub tiles: Vec<TileSaveData>,
}

impl TileSave {
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> String {
        // Panic here indicates an internal bug in the data format
        serde_json::to_string(self).expect("error serializing tiles")
    }

    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("error deserializing tiles")
    }

    #[cfg(feature = "bin")]
    pub fn to_bin(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Panic here indicates an internal bug in the data format
        serde_cbor::to_writer(&mut buffer, self)
            .expect("error serializing tiles");
        buffer
    }

    #[cfg(feature = "bin")]
    pub fn from_bin(read: impl std::io::Read) -> anyhow::Result<Self> {
        serde_cbor::from_reader(read).context("error deserializing tiles")
    }
}

impl Hexasphere {
    /// Export every tile that has a custom fill or a tag. Temporary colors
    /// aren't saved.
    pub fn save_tiles(&self) -> TileSave {
        let tiles = self
            .tiles
            .iter()
            .filter(|tile| {
                tile.fill.is_custom() || tile.tag.is_some() || tile.tag_int != 0
            })
            .map(|tile| TileSaveData {
                tile_index: tile.index,
                color: tile.fill.color,
                texture_index: tile.fill.texture_index,
                tag: tile.tag.clone(),
                tag_int: tile.tag_int,
            })
            .collect();
        TileSave {
            tile_count: self.tiles.len(),
            tiles,
        }
    }

    /// Apply saved tile state. Entries for tiles that don't exist on this
    /// sphere are skipped. Returns the number of tiles that were updated.
    pub fn load_tiles(&mut self, save: &TileSave) -> usize {
        if save.tile_count != self.tiles.len() {
            warn!(
                "Loading tiles saved from a sphere with {} tiles into one \
                 with {}",
                save.tile_count,
                self.tiles.len()
            );
        }

        let mut loaded = 0;
        for data in &save.tiles {
            if data.tile_index >= self.tiles.len() {
                warn!("Skipping saved data for tile {}", data.tile_index);
                continue;
            }
            let index = data.tile_index;
            if data.texture_index != 0 {
                let tint = data.color.unwrap_or(Color3::WHITE);
                self.set_tile_texture(index, data.texture_index, tint, false);
            } else if let Some(color) = data.color {
                self.set_tile_color(index, color, false);
            }
            self.set_tile_tag(index, data.tag.clone().unwrap_or_default());
            self.set_tile_tag_int(index, data.tag_int);
            loaded += 1;
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HexasphereConfig;

    fn sphere() -> Hexasphere {
        Hexasphere::generate(HexasphereConfig {
            divisions: 3,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_save_only_custom_tiles() {
        let mut sphere = sphere();
        let red = Color3::new(1.0, 0.0, 0.0);
        sphere.set_tile_color(4, red, false);
        sphere.set_tile_color(5, red, true);
        sphere.set_tile_tag(6, "port");
        sphere.set_tile_tag_int(7, -3);
        sphere.set_tile_texture(8, 2, Color3::WHITE, false);

        let save = sphere.save_tiles();
        assert_eq!(save.tile_count, 92);
        let indices: Vec<usize> =
            save.tiles.iter().map(|data| data.tile_index).collect();
        assert_eq!(indices, vec![4, 6, 7, 8]);
        assert_eq!(save.tiles[0].color, Some(red));
        assert_eq!(save.tiles[1].tag.as_deref(), Some("port"));
        assert_eq!(save.tiles[2].tag_int, -3);
        assert_eq!(save.tiles[3].texture_index, 2);
    }

    #[test]
    fn test_load_restores_state() {
        let mut original = sphere();
        let blue = Color3::new(0.0, 0.0, 1.0);
        original.set_tile_color(10, blue, false);
        original.set_tile_tag(11, "home");
        original.set_tile_texture(12, 5, blue, false);
        let mut save = original.save_tiles();
        save.tiles.push(TileSaveData {
            tile_index: 5000,
            color: None,
            texture_index: 0,
            tag: Some("lost".into()),
            tag_int: 0,
        });

        let mut loaded = sphere();
        assert_eq!(loaded.load_tiles(&save), 3);
        assert_eq!(loaded.tile_color(10, true), Some(blue));
        assert_eq!(loaded.tile_with_tag("home"), Some(11));
        assert_eq!(loaded.tile_texture(12), Some(5));
        assert_eq!(loaded.tile_color(12, true), Some(blue));
        assert_eq!(loaded.tile_with_tag("lost"), None);
        assert_eq!(loaded.save_tiles().tiles, original.save_tiles().tiles);
    }
}
