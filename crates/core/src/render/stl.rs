//! This module provides logic for rendering a hexasphere as an STL. Only
//! available with the "stl" feature enabled.

use crate::{
    render::template::{ShadedMode, ShadedTemplate},
    sphere::tile::Tile,
    Hexasphere,
};
use nalgebra::Vector3;
use stl_io::{Normal, Triangle, Vertex};

/// Render the given sphere as an STL model. STL only carries geometric data,
/// so no colors/textures. Each tile is a prism rising from the base sphere
/// to its extruded height, so the result is one closed surface.
pub fn grid_to_stl(sphere: &Hexasphere) -> Vec<Triangle> {
    let tiles = sphere.tiles();
    let mut mesh =
        Vec::with_capacity(tiles.len() * TileSolid::TRIANGLES_PER_TILE);

    for tile in tiles {
        let solid = TileSolid::new(sphere, tile);
        solid.add_to_mesh(&mut mesh);
    }

    mesh
}

/// A convenience struct for converting a tile into STL triangles
#[derive(Clone, Debug)]
struct TileSolid<'a> {
    tile: &'a Tile,
    top: f64,
    /// Height of the top face of the tile across each edge
    adjacent_tops: Vec<f64>,
}

impl<'a> TileSolid<'a> {
    /// AT MOST 16 triangles per tile:
    /// - 4 for the top
    /// - MAXIMUM of 2 per side, times 6 sides
    ///   - These get culled if adjacent to a taller tile
    const TRIANGLES_PER_TILE: usize = 16;

    fn new(sphere: &Hexasphere, tile: &'a Tile) -> Self {
        let adjacent_tops = tile
            .neighbours
            .iter()
            .map(|&n| sphere.extrusion_scale(&sphere.tiles()[n]))
            .collect();
        Self {
            tile,
            top: sphere.extrusion_scale(tile),
            adjacent_tops,
        }
    }

    /// Convert this tile to triangle soup and add them to the soup pot
    fn add_to_mesh(self, mesh: &mut Vec<Triangle>) {
        let vertices = &self.tile.vertices;
        let template =
            ShadedTemplate::get(self.tile.is_pentagon(), ShadedMode::Flat);

        // Top face. Tile boundaries are counter-clockwise from the outside,
        // which is what STL wants (right-hand rule).
        for corners in template.indices.chunks_exact(3) {
            let points = [
                vertices[corners[0] as usize] * self.top,
                vertices[corners[1] as usize] * self.top,
                vertices[corners[2] as usize] * self.top,
            ];
            mesh.push(triangle(points));
        }

        // Walls, down to the neighbour across each edge. If the neighbour is
        // at least as tall, the wall would be hidden inside it.
        for (k, &bottom) in self.adjacent_tops.iter().enumerate() {
            if bottom >= self.top {
                continue;
            }
            let a = vertices[k];
            let b = vertices[(k + 1) % vertices.len()];
            //      a_top       b_top
            //          +-----+
            //          |   / |
            //          |  /  |
            //          | /   |
            //          +-----+
            //  a_bottom       b_bottom
            // Seen from outside the tile, a is on the left
            let (a_top, b_top) = (a * self.top, b * self.top);
            let (a_bottom, b_bottom) = (a * bottom, b * bottom);
            mesh.push(triangle([a_bottom, b_bottom, b_top]));
            mesh.push(triangle([a_bottom, b_top, a_top]));
        }
    }
}

fn triangle(points: [Vector3<f64>; 3]) -> Triangle {
    let [p1, p2, p3] = points;
    let normal = (p2 - p1)
        .cross(&(p3 - p1))
        .try_normalize(f64::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    let vertex =
        |p: Vector3<f64>| Vertex::new([p.x as f32, p.y as f32, p.z as f32]);
    Triangle {
        normal: Normal::new([
            normal.x as f32,
            normal.y as f32,
            normal.z as f32,
        ]),
        vertices: [vertex(p1), vertex(p2), vertex(p3)],
    }
}
