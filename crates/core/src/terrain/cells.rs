use crate::{
    render::unit::Color3, terrain::ElevationTarget, util::range::NumRange,
};
use anyhow::ensure;
use nalgebra::Vector3;

/// Terrain cells backed by the vertices of an arbitrary triangle mesh, for
/// bodies that aren't hexaspheres. Two vertices are neighbours if they share
/// a triangle edge.
#[derive(Clone, Debug)]
pub struct MeshCells {
    positions: Vec<Vector3<f64>>,
    neighbours: Vec<Vec<usize>>,
    elevations: Vec<f64>,
    colors: Vec<Option<Color3>>,
    can_cross: Vec<bool>,
}

impl MeshCells {
    /// Build cells from an indexed mesh. Returns an error if a triangle
    /// refers to a vertex that doesn't exist.
    pub fn new(
        positions: Vec<Vector3<f64>>,
        triangles: &[[usize; 3]],
    ) -> anyhow::Result<Self> {
        let len = positions.len();
        let mut neighbours = vec![Vec::new(); len];
        for (i, triangle) in triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (triangle[k], triangle[(k + 1) % 3]);
                ensure!(
                    a < len && b < len,
                    "triangle {} refers to a vertex outside 0..{}",
                    i,
                    len
                );
                if a != b && !neighbours[a].contains(&b) {
                    neighbours[a].push(b);
                    neighbours[b].push(a);
                }
            }
        }

        Ok(Self {
            positions,
            neighbours,
            elevations: vec![0.0; len],
            colors: vec![None; len],
            can_cross: vec![true; len],
        })
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    /// Color of each cell, if one has been assigned
    pub fn colors(&self) -> &[Option<Color3>] {
        &self.colors
    }

    pub fn can_cross(&self) -> &[bool] {
        &self.can_cross
    }
}

impl ElevationTarget for MeshCells {
    fn cell_count(&self) -> usize {
        self.positions.len()
    }

    fn cell_position(&self, cell: usize) -> Vector3<f64> {
        self.positions[cell]
    }

    fn cell_neighbours(&self, cell: usize) -> &[usize] {
        &self.neighbours[cell]
    }

    fn elevation(&self, cell: usize) -> f64 {
        self.elevations[cell]
    }

    fn set_elevation(&mut self, cell: usize, elevation: f64) {
        self.elevations[cell] = NumRange::normal_range().clamp(elevation);
    }

    fn set_color(&mut self, cell: usize, color: Color3) {
        self.colors[cell] = Some(color);
    }

    fn set_can_cross(&mut self, cell: usize, can_cross: bool) {
        self.can_cross[cell] = can_cross;
    }
}
