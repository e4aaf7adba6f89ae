use crate::{
    render::{unit::Color3, MeshSpan},
    sphere::geodesic::Geodesic,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// The group every tile starts in. Groups are a bitmask, so a tile can be in
/// several at once.
pub const DEFAULT_GROUP: u32 = 1;

/// A hexasphere is made of tiles. Every tile is a hexagon, except for 12
/// pentagons that sit where the corners of the original icosahedron were.
///
/// A tile's shape and neighbours are fixed when the sphere is generated. The
/// rest of its state (extrusion, fill, crossability, tags) can be changed
/// through [Hexasphere](crate::Hexasphere), which keeps the mesh buffers in
/// sync.
#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) index: usize,
    pub(crate) center: Vector3<f64>,
    /// Boundary polygon, counter-clockwise when viewed from outside the
    /// sphere. Each vertex is the centroid of one triangle of the geodesic
    /// mesh, projected onto the unit sphere.
    pub(crate) vertices: Vec<Vector3<f64>>,
    /// Geodesic face ID behind each boundary vertex. Adjacent tiles share
    /// these, which lets wireframes share vertices too.
    pub(crate) vertex_ids: Vec<usize>,
    /// `neighbours[k]` is across the edge from `vertices[k]` to
    /// `vertices[k + 1]`
    pub(crate) neighbours: Vec<usize>,

    pub(crate) extrude_amount: f64,
    pub(crate) can_cross: bool,
    pub(crate) group: u32,
    pub(crate) tag: Option<String>,
    pub(crate) tag_int: i32,
    pub(crate) fill: TileFill,
    pub(crate) temporary_fill: Option<TileFill>,
    pub(crate) texture_rotation: f32,

    pub(crate) shaded_span: Option<MeshSpan>,
    pub(crate) wire_span: Option<MeshSpan>,
}

/// How a tile is painted. A tile with no custom color and no texture uses
/// the sphere's default color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileFill {
    /// Custom color. For textured tiles this is the tint.
    pub color: Option<Color3>,
    /// Index into the caller's texture list. Zero means untextured.
    pub texture_index: u32,
}

impl TileFill {
    pub fn is_custom(&self) -> bool {
        self.color.is_some() || self.texture_index != 0
    }
}

impl Tile {
    fn new(
        index: usize,
        vertices: Vec<Vector3<f64>>,
        vertex_ids: Vec<usize>,
        neighbours: Vec<usize>,
    ) -> Self {
        let center = vertices.iter().sum::<Vector3<f64>>()
            / vertices.len() as f64;
        Self {
            index,
            center,
            vertices,
            vertex_ids,
            neighbours,
            extrude_amount: 0.0,
            can_cross: true,
            group: DEFAULT_GROUP,
            tag: None,
            tag_int: 0,
            fill: TileFill::default(),
            temporary_fill: None,
            texture_rotation: 0.0,
            shaded_span: None,
            wire_span: None,
        }
    }

    /// Dense index, stable until the sphere is regenerated
    pub fn index(&self) -> usize {
        self.index
    }

    /// Average of the boundary vertices, in local space. This sits slightly
    /// inside the unit sphere, since the tile is flat.
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// Radial scale of the top face once extrusion is applied, relative to
    /// the base sphere
    pub fn top_scale(&self, extrude_multiplier: f64) -> f64 {
        1.0 + self.extrude_amount * extrude_multiplier
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    pub fn is_pentagon(&self) -> bool {
        self.vertices.len() == 5
    }

    /// Elevation, in [0, 1]
    pub fn extrude_amount(&self) -> f64 {
        self.extrude_amount
    }

    /// Can paths go through this tile?
    pub fn can_cross(&self) -> bool {
        self.can_cross
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn tag_int(&self) -> i32 {
        self.tag_int
    }

    /// Persistent fill, ignoring any temporary override
    pub fn fill(&self) -> TileFill {
        self.fill
    }

    pub fn temporary_fill(&self) -> Option<TileFill> {
        self.temporary_fill
    }

    /// Texture rotation in radians
    pub fn texture_rotation(&self) -> f32 {
        self.texture_rotation
    }

    /// Where this tile's vertices live in the shaded mesh, if it has one
    pub fn shaded_span(&self) -> Option<MeshSpan> {
        self.shaded_span
    }

    /// Where this tile's vertices live in the wireframe mesh. Flat
    /// wireframes share vertices between tiles, so there's no span for them.
    pub fn wire_span(&self) -> Option<MeshSpan> {
        self.wire_span
    }
}

/// Build the dual of a geodesic mesh: one tile per point, bounded by the
/// centroids of the faces around that point.
pub fn build_tiles(geodesic: &Geodesic) -> Vec<Tile> {
    let Geodesic { points, faces } = geodesic;

    let mut faces_around: Vec<Vec<usize>> =
        vec![Vec::with_capacity(6); points.len()];
    for (face_id, face) in faces.iter().enumerate() {
        for &point in face {
            faces_around[point].push(face_id);
        }
    }

    let centroids: Vec<Vector3<f64>> = faces
        .iter()
        .map(|&[a, b, c]| {
            ((points[a] + points[b] + points[c]) / 3.0).normalize()
        })
        .collect();

    faces_around
        .into_iter()
        .enumerate()
        .map(|(index, around)| {
            let mut ring = order_ring(index, around, faces);

            // Flip anything wound clockwise (viewed from outside)
            let normal = (centroids[ring[1]] - centroids[ring[0]])
                .cross(&(centroids[ring[2]] - centroids[ring[0]]));
            if normal.dot(&points[index]) < 0.0 {
                ring.reverse();
            }

            let vertices = ring.iter().map(|&face| centroids[face]).collect();
            let neighbours: Vec<usize> = ring
                .iter()
                .zip(ring.iter().cycle().skip(1))
                .filter_map(|(&a, &b)| {
                    shared_point(index, faces[a], faces[b])
                })
                .collect();
            debug_assert_eq!(
                neighbours.len(),
                ring.len(),
                "tile {} has a broken face ring",
                index
            );
            Tile::new(index, vertices, ring, neighbours)
        })
        .collect()
}

/// Sort the faces around a point so that each face shares an edge with the
/// next one
fn order_ring(
    center: usize,
    mut remaining: Vec<usize>,
    faces: &[[usize; 3]],
) -> Vec<usize> {
    let mut ring = Vec::with_capacity(remaining.len());
    if remaining.is_empty() {
        return ring;
    }
    ring.push(remaining.swap_remove(0));

    while !remaining.is_empty() {
        let current = faces[ring[ring.len() - 1]];
        let next = remaining.iter().position(|&face| {
            shared_point(center, current, faces[face]).is_some()
        });
        match next {
            Some(i) => ring.push(remaining.remove(i)),
            None => break,
        }
    }
    ring
}

/// Find the point, other than `center`, that two faces have in common
fn shared_point(
    center: usize,
    a: [usize; 3],
    b: [usize; 3],
) -> Option<usize> {
    a.iter()
        .copied()
        .find(|&point| point != center && b.contains(&point))
}
