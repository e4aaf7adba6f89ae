//! Display buffers for a hexasphere. Tiles are packed into chunks, each small
//! enough to index with 16 bits. Chunks are rebuilt from scratch when the
//! sphere is regenerated, and patched in place when a tile's cosmetic state
//! changes.

#[cfg(feature = "stl")]
pub mod stl;
mod template;
pub mod unit;

use crate::{
    config::HexasphereConfig,
    render::{
        template::{ShadedMode, ShadedTemplate},
        unit::Color3,
    },
    sphere::tile::{Tile, TileFill},
    timed,
};
use fnv::FnvBuildHasher;
use log::debug;
use nalgebra::Vector3;
use std::{collections::HashMap, iter, ops::Range};
use strum::Display;

/// Location of one tile's vertices within a chunk
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshSpan {
    pub chunk: usize,
    pub start: usize,
    pub len: usize,
}

impl MeshSpan {
    fn range(self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// How a chunk's indices should be read
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Every 3 indices form a triangle
    Triangles,
    /// Every 2 indices form a line segment
    Lines,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum MeshLayer {
    Shaded,
    Wireframe,
}

/// A bounded geometry buffer.
///
/// Positions are on the unit sphere, **without** extrusion applied. In
/// extruded meshes, each vertex carries its tile's extrude amount instead, and
/// it's up to the renderer to push the vertex outward by
/// `1 + amount * extrude_multiplier`.
///
/// Vertex attribute layout:
/// - Shaded UVs: `(u, v, texture index, extrude amount)`
/// - Extruded wireframe UVs: `(tile index, extrude amount, 0, 0)`
/// - Flat wireframes have no UVs or colors
#[derive(Clone, Debug)]
pub struct MeshChunk {
    topology: Topology,
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
    uvs: Vec<[f32; 4]>,
    colors: Vec<[f32; 4]>,
    tiles: Range<usize>,
    uvs_dirty: bool,
    colors_dirty: bool,
}

impl MeshChunk {
    fn new(topology: Topology, first_tile: usize) -> Self {
        Self {
            topology,
            positions: Vec::new(),
            indices: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            tiles: first_tile..first_tile,
            uvs_dirty: false,
            colors_dirty: false,
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn uvs(&self) -> &[[f32; 4]] {
        &self.uvs
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Indices of the tiles with geometry in this chunk. Tiles are packed in
    /// index order, so this is always contiguous.
    pub fn tiles(&self) -> Range<usize> {
        self.tiles.clone()
    }
}

/// A chunk that has been patched since the last flush, and which of its
/// arrays need to be re-uploaded
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChunkUpdate {
    pub layer: MeshLayer,
    pub chunk: usize,
    pub uvs: bool,
    pub colors: bool,
}

/// All display buffers for one sphere
#[derive(Clone, Debug, Default)]
pub struct HexasphereMesh {
    shaded: Vec<MeshChunk>,
    wireframe: Vec<MeshChunk>,
}

impl HexasphereMesh {
    /// Pack every tile into chunks according to the config. Records each
    /// tile's span as it goes, replacing any previous spans.
    pub(crate) fn build(
        tiles: &mut [Tile],
        config: &HexasphereConfig,
    ) -> Self {
        for tile in tiles.iter_mut() {
            tile.shaded_span = None;
            tile.wire_span = None;
        }

        let shaded = if config.style.has_shaded() {
            timed!("Shaded mesh build", build_shaded(tiles, config))
        } else {
            Vec::new()
        };
        let wireframe = if !config.style.has_wireframe() {
            Vec::new()
        } else if is_extruded(config) {
            timed!("Wireframe build", build_wire_extruded(tiles, config))
        } else {
            timed!("Wireframe build", build_wire_flat(tiles, config))
        };

        debug!(
            "Built {} shaded and {} wireframe chunks",
            shaded.len(),
            wireframe.len()
        );
        Self { shaded, wireframe }
    }

    pub fn shaded(&self) -> &[MeshChunk] {
        &self.shaded
    }

    pub fn wireframe(&self) -> &[MeshChunk] {
        &self.wireframe
    }

    pub fn chunks(&self, layer: MeshLayer) -> &[MeshChunk] {
        match layer {
            MeshLayer::Shaded => &self.shaded,
            MeshLayer::Wireframe => &self.wireframe,
        }
    }

    /// Rewrite one tile's UVs, in every layer that has a span for it
    pub(crate) fn patch_uvs(
        &mut self,
        tile: &Tile,
        config: &HexasphereConfig,
    ) {
        if let Some(span) = tile.shaded_span {
            let template =
                ShadedTemplate::get(tile.is_pentagon(), shaded_mode(config));
            let chunk = &mut self.shaded[span.chunk];
            let uvs = shaded_uvs(tile, template);
            for (dest, uv) in chunk.uvs[span.range()].iter_mut().zip(uvs) {
                *dest = uv;
            }
            chunk.uvs_dirty = true;
        }
        if let Some(span) = tile.wire_span {
            let chunk = &mut self.wireframe[span.chunk];
            chunk.uvs[span.range()]
                .iter_mut()
                .for_each(|dest| *dest = wire_uv(tile));
            chunk.uvs_dirty = true;
        }
    }

    /// Rewrite one tile's vertex colors, in every layer that has a span for it
    pub(crate) fn patch_colors(
        &mut self,
        tile: &Tile,
        config: &HexasphereConfig,
    ) {
        if let Some(span) = tile.shaded_span {
            let color = fill_color(tile.fill, config).to_rgba();
            let chunk = &mut self.shaded[span.chunk];
            chunk.colors[span.range()]
                .iter_mut()
                .for_each(|dest| *dest = color);
            chunk.colors_dirty = true;
        }
        if let (Some(span), true) =
            (tile.wire_span, config.wireframe_color_from_tile)
        {
            let color = wire_color(tile, config);
            let chunk = &mut self.wireframe[span.chunk];
            chunk.colors[span.range()]
                .iter_mut()
                .for_each(|dest| *dest = color);
            chunk.colors_dirty = true;
        }
    }

    /// Collect every chunk with pending changes, clearing the dirty flags
    pub(crate) fn take_updates(&mut self) -> Vec<ChunkUpdate> {
        let mut updates = Vec::new();
        let layers = [
            (MeshLayer::Shaded, &mut self.shaded),
            (MeshLayer::Wireframe, &mut self.wireframe),
        ];
        for (layer, chunks) in layers {
            for (index, chunk) in chunks.iter_mut().enumerate() {
                if chunk.uvs_dirty || chunk.colors_dirty {
                    updates.push(ChunkUpdate {
                        layer,
                        chunk: index,
                        uvs: chunk.uvs_dirty,
                        colors: chunk.colors_dirty,
                    });
                    chunk.uvs_dirty = false;
                    chunk.colors_dirty = false;
                }
            }
        }
        updates
    }
}

/// Fills chunks in order, opening a new one whenever the next tile wouldn't
/// fit under the vertex ceiling
struct ChunkPacker {
    topology: Topology,
    ceiling: usize,
    chunks: Vec<MeshChunk>,
}

impl ChunkPacker {
    fn new(topology: Topology, ceiling: u32) -> Self {
        Self {
            topology,
            ceiling: ceiling as usize,
            chunks: Vec::new(),
        }
    }

    fn fits(&self, vertex_count: usize) -> bool {
        self.chunks.last().map_or(false, |chunk| {
            chunk.positions.len() + vertex_count <= self.ceiling
        })
    }

    /// Get the chunk that a tile with the given number of new vertices goes
    /// into. Also returns whether a new chunk had to be opened.
    fn reserve(&mut self, tile: usize, vertex_count: usize) -> (usize, bool) {
        let opened = !self.fits(vertex_count);
        if opened {
            self.chunks.push(MeshChunk::new(self.topology, tile));
        }
        let index = self.chunks.len() - 1;
        self.chunks[index].tiles.end = tile + 1;
        (index, opened)
    }

    fn finish(self) -> Vec<MeshChunk> {
        self.chunks
    }
}

fn is_extruded(config: &HexasphereConfig) -> bool {
    config.extruded && !config.inverted
}

fn shaded_mode(config: &HexasphereConfig) -> ShadedMode {
    if config.inverted {
        ShadedMode::Inverted
    } else if config.extruded {
        ShadedMode::Extruded
    } else {
        ShadedMode::Flat
    }
}

fn to_f32(v: &Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// Color a tile is painted with, ignoring temporary overrides. Textured
/// tiles without a tint are white, so the texture shows unaltered.
fn fill_color(fill: TileFill, config: &HexasphereConfig) -> Color3 {
    match fill.color {
        Some(color) => color,
        None if fill.texture_index != 0 => Color3::WHITE,
        None => config.default_shaded_color,
    }
}

fn shaded_uvs<'a>(
    tile: &'a Tile,
    template: &'static ShadedTemplate,
) -> impl Iterator<Item = [f32; 4]> + 'a {
    let (sin, cos) = tile.texture_rotation.sin_cos();
    let texture = tile.fill.texture_index as f32;
    let extrude = tile.extrude_amount as f32;
    template.uvs.iter().map(move |&[u, v]| {
        // Rotate around the middle of the texture
        let (x, y) = (u - 0.5, v - 0.5);
        [
            x * cos - y * sin + 0.5,
            x * sin + y * cos + 0.5,
            texture,
            extrude,
        ]
    })
}

fn wire_uv(tile: &Tile) -> [f32; 4] {
    [tile.index as f32, tile.extrude_amount as f32, 0.0, 0.0]
}

fn wire_color(tile: &Tile, config: &HexasphereConfig) -> [f32; 4] {
    if config.wireframe_color_from_tile {
        fill_color(tile.fill, config).to_rgba()
    } else {
        Color3::WHITE.to_rgba()
    }
}

fn build_shaded(
    tiles: &mut [Tile],
    config: &HexasphereConfig,
) -> Vec<MeshChunk> {
    let mode = shaded_mode(config);
    let mut packer =
        ChunkPacker::new(Topology::Triangles, config.max_vertices_per_chunk);

    for tile in tiles.iter_mut() {
        let template = ShadedTemplate::get(tile.is_pentagon(), mode);
        let count = template.vertex_count();
        let (chunk_index, _) = packer.reserve(tile.index, count);
        let chunk = &mut packer.chunks[chunk_index];
        let start = chunk.positions.len();

        chunk.positions.extend(tile.vertices.iter().map(to_f32));
        chunk.positions.extend(template.ridge.iter().map(|&(a, b)| {
            to_f32(&((tile.vertices[a] + tile.vertices[b]) * 0.5))
        }));
        chunk
            .indices
            .extend(template.indices.iter().map(|&i| start as u32 + i));
        chunk.uvs.extend(shaded_uvs(tile, template));
        let color = fill_color(tile.fill, config).to_rgba();
        chunk.colors.extend(iter::repeat(color).take(count));

        tile.shaded_span = Some(MeshSpan {
            chunk: chunk_index,
            start,
            len: count,
        });
    }

    packer.finish()
}

/// Flat wireframes share boundary vertices between neighbouring tiles within
/// a chunk, so each tile only costs the vertices that aren't already there
fn build_wire_flat(
    tiles: &[Tile],
    config: &HexasphereConfig,
) -> Vec<MeshChunk> {
    let mut packer =
        ChunkPacker::new(Topology::Lines, config.max_vertices_per_chunk);
    let mut shared: HashMap<usize, u32, FnvBuildHasher> = HashMap::default();

    for tile in tiles.iter() {
        let new_vertices = tile
            .vertex_ids
            .iter()
            .filter(|id| !shared.contains_key(id))
            .count();
        let (chunk_index, opened) = packer.reserve(tile.index, new_vertices);
        if opened {
            shared.clear();
        }
        let chunk = &mut packer.chunks[chunk_index];

        let indices: Vec<u32> = tile
            .vertex_ids
            .iter()
            .zip(&tile.vertices)
            .map(|(&id, vertex)| {
                *shared.entry(id).or_insert_with(|| {
                    chunk.positions.push(to_f32(vertex));
                    (chunk.positions.len() - 1) as u32
                })
            })
            .collect();
        push_outline(&mut chunk.indices, &indices);
    }

    packer.finish()
}

/// Extruded wireframes need per-tile attributes, so nothing is shared
fn build_wire_extruded(
    tiles: &mut [Tile],
    config: &HexasphereConfig,
) -> Vec<MeshChunk> {
    let mut packer =
        ChunkPacker::new(Topology::Lines, config.max_vertices_per_chunk);

    for tile in tiles.iter_mut() {
        let count = tile.vertices.len();
        let (chunk_index, _) = packer.reserve(tile.index, count);
        let chunk = &mut packer.chunks[chunk_index];
        let start = chunk.positions.len();

        chunk.positions.extend(tile.vertices.iter().map(to_f32));
        chunk.uvs.extend(iter::repeat(wire_uv(tile)).take(count));
        chunk
            .colors
            .extend(iter::repeat(wire_color(tile, config)).take(count));
        let indices: Vec<u32> =
            (start..start + count).map(|i| i as u32).collect();
        push_outline(&mut chunk.indices, &indices);

        tile.wire_span = Some(MeshSpan {
            chunk: chunk_index,
            start,
            len: count,
        });
    }

    packer.finish()
}

/// Add a closed loop of line segments through the given vertices
fn push_outline(indices: &mut Vec<u32>, ring: &[u32]) {
    for (k, &index) in ring.iter().enumerate() {
        indices.push(index);
        indices.push(ring[(k + 1) % ring.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::{geodesic::Geodesic, tile::build_tiles};

    fn tiles(divisions: u32) -> Vec<Tile> {
        build_tiles(&Geodesic::new(divisions, [0.0; 3]))
    }

    #[test]
    fn test_chunk_ceiling() {
        let mut tiles = tiles(5);
        for &extruded in &[false, true] {
            let config = HexasphereConfig {
                max_vertices_per_chunk: 100,
                extruded,
                ..Default::default()
            };
            let mesh = HexasphereMesh::build(&mut tiles, &config);
            assert!(mesh.shaded().len() > 1);
            assert!(mesh.wireframe().len() > 1);
            for chunk in mesh.shaded().iter().chain(mesh.wireframe()) {
                assert!(chunk.vertex_count() <= 100);
                let max = chunk.vertex_count() as u32;
                assert!(chunk.indices().iter().all(|&i| i < max));
            }
        }
    }

    #[test]
    fn test_spans_cover_tiles() {
        let mut tiles = tiles(4);
        let config = HexasphereConfig {
            max_vertices_per_chunk: 256,
            extruded: true,
            ..Default::default()
        };
        let mesh = HexasphereMesh::build(&mut tiles, &config);
        for tile in &tiles {
            let span = tile.shaded_span().unwrap();
            let chunk = &mesh.shaded()[span.chunk];
            assert!(chunk.tiles().contains(&tile.index()));
            assert!(span.start + span.len <= chunk.vertex_count());
            // Boundary vertices plus two ridge vertices
            assert_eq!(span.len, tile.vertices().len() + 2);
            assert!(tile.wire_span().is_some());
        }
    }

    #[test]
    fn test_flat_wireframe_shares_vertices() {
        let mut tiles = tiles(3);
        let config = HexasphereConfig {
            style: crate::Style::Wireframe,
            ..Default::default()
        };
        let mesh = HexasphereMesh::build(&mut tiles, &config);
        assert!(mesh.shaded().is_empty());
        assert_eq!(mesh.wireframe().len(), 1);
        let chunk = &mesh.wireframe()[0];
        // One vertex per geodesic face, one segment per tile edge
        assert_eq!(chunk.vertex_count(), 20 * 9);
        assert_eq!(chunk.indices().len(), 2 * (12 * 5 + 80 * 6));
        assert!(tiles.iter().all(|tile| tile.wire_span().is_none()));
    }

    #[test]
    fn test_inverted_is_never_extruded() {
        let mut tiles = tiles(2);
        let config = HexasphereConfig {
            inverted: true,
            extruded: true,
            ..Default::default()
        };
        let mesh = HexasphereMesh::build(&mut tiles, &config);
        let triangles: usize =
            mesh.shaded().iter().map(|c| c.indices().len() / 3).sum();
        assert_eq!(triangles, 12 * 3 + 30 * 4);
        // Wireframe falls back to the flat, shared layout
        assert!(mesh.wireframe()[0].uvs().is_empty());
    }

    #[test]
    fn test_patch_marks_dirty() {
        let mut tiles = tiles(3);
        let config = HexasphereConfig {
            max_vertices_per_chunk: 128,
            ..Default::default()
        };
        let mut mesh = HexasphereMesh::build(&mut tiles, &config);
        assert!(mesh.take_updates().is_empty());

        let tile = &mut tiles[50];
        tile.fill.color = Some(Color3::BLACK);
        mesh.patch_colors(tile, &config);
        let span = tile.shaded_span().unwrap();
        let chunk = &mesh.shaded()[span.chunk];
        assert_eq!(chunk.colors()[span.start], [0.0, 0.0, 0.0, 1.0]);

        assert_eq!(
            mesh.take_updates(),
            vec![ChunkUpdate {
                layer: MeshLayer::Shaded,
                chunk: span.chunk,
                uvs: false,
                colors: true,
            }]
        );
        assert!(mesh.take_updates().is_empty());
    }
}
