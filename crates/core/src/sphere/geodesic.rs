use crate::{sphere::point::PointCache, util};
use nalgebra::{Rotation3, Vector3};

/// The golden ratio. The 12 corners of an icosahedron are the cyclic
/// permutations of `(0, ±1, ±φ)`.
const PHI: f64 = 1.618_033_988_749_895;

/// Icosahedron corners. The order matters: corners get the first 12 point IDs,
/// which makes tiles 0-11 the pentagons.
const CORNERS: [[f64; 3]; 12] = [
    [1.0, PHI, 0.0],
    [-1.0, PHI, 0.0],
    [1.0, -PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [0.0, 1.0, PHI],
    [0.0, -1.0, PHI],
    [0.0, 1.0, -PHI],
    [0.0, -1.0, -PHI],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, 1.0],
    [PHI, 0.0, -1.0],
    [-PHI, 0.0, -1.0],
];

/// The 20 faces of the icosahedron, as indexes into [CORNERS]. Iteration
/// order here determines point insertion order, and therefore tile indices.
const SEED_FACES: [[usize; 3]; 20] = [
    [0, 1, 4],
    [1, 9, 4],
    [4, 9, 5],
    [5, 9, 3],
    [2, 3, 7],
    [3, 2, 5],
    [7, 10, 2],
    [0, 8, 10],
    [0, 4, 8],
    [8, 2, 10],
    [8, 4, 5],
    [8, 5, 2],
    [1, 0, 6],
    [11, 1, 6],
    [3, 9, 11],
    [6, 10, 7],
    [3, 11, 7],
    [11, 6, 7],
    [6, 0, 10],
    [9, 1, 11],
];

/// A subdivided icosahedron: the triangle mesh whose dual becomes the tile
/// graph. Points are on the unit sphere, indexed by point ID.
#[derive(Clone, Debug)]
pub struct Geodesic {
    pub points: Vec<Vector3<f64>>,
    pub faces: Vec<[usize; 3]>,
}

impl Geodesic {
    /// Subdivide each icosahedron face into `divisions²` triangles. Rotation
    /// is a set of Euler angles in degrees (roll, pitch, yaw), applied to the
    /// corners before subdividing.
    pub fn new(divisions: u32, rotation: [f64; 3]) -> Self {
        let n = divisions as usize;
        let mut cache = PointCache::with_capacity(util::tile_count(divisions));

        let [roll, pitch, yaw] = rotation;
        let rotation = Rotation3::from_euler_angles(
            roll.to_radians(),
            pitch.to_radians(),
            yaw.to_radians(),
        );
        let corners: Vec<usize> = CORNERS
            .iter()
            .map(|&[x, y, z]| cache.insert(rotation * Vector3::new(x, y, z)))
            .collect();

        let mut faces = Vec::with_capacity(20 * n * n);
        for &[a, b, c] in SEED_FACES.iter() {
            subdivide_face(
                &mut cache,
                [corners[a], corners[b], corners[c]],
                n,
                &mut faces,
            );
        }

        let points = cache
            .into_positions()
            .into_iter()
            .map(|point| point.normalize())
            .collect();
        Self { points, faces }
    }
}

/// Split one seed triangle into rows. Row `i` has `i + 1` points, spread
/// between the `i`th point of each of the two edges leaving the first corner.
/// Each pair of rows is stitched together into triangles.
fn subdivide_face(
    cache: &mut PointCache,
    [top, left_corner, right_corner]: [usize; 3],
    n: usize,
    faces: &mut Vec<[usize; 3]>,
) {
    let left = cache.subdivide(top, left_corner, n);
    let right = cache.subdivide(top, right_corner, n);

    let mut bottom = vec![top];
    for i in 1..=n {
        let prev = bottom;
        bottom = cache.subdivide(left[i], right[i], i);

        faces.push([prev[0], bottom[0], bottom[1]]);
        for j in 1..i {
            faces.push([prev[j], bottom[j], bottom[j + 1]]);
            faces.push([prev[j - 1], prev[j], bottom[j]]);
        }
    }
}
