use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use nalgebra::Vector3;

/// Dedup key for a point. Coordinates are quantized onto a fine grid, so two
/// computations of the same geometric point that differ only by rounding
/// error land on the same key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct PointKey([i64; 3]);

impl PointKey {
    /// Grid cells per unit. Icosahedron corners sit at radius ~1.9, and the
    /// closest two distinct points get at 1024 divisions is ~1e-3 apart.
    const SCALE: f64 = 1e7;

    fn new(position: &Vector3<f64>) -> Self {
        Self([
            (position.x * Self::SCALE).round() as i64,
            (position.y * Self::SCALE).round() as i64,
            (position.z * Self::SCALE).round() as i64,
        ])
    }
}

/// The set of unique points produced while subdividing. Each point gets a
/// dense ID, which is its insertion order. That order is stable for a given
/// set of inputs, and later becomes the tile index of the tile built around
/// the point.
///
/// A cache lives for exactly one generation pass and is owned by the builder
/// running that pass, so separate grids never share points.
#[derive(Clone, Debug, Default)]
pub struct PointCache {
    points: IndexMap<PointKey, Vector3<f64>, FnvBuildHasher>,
}

impl PointCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: IndexMap::with_capacity_and_hasher(
                capacity,
                FnvBuildHasher::default(),
            ),
        }
    }

    /// Get the ID of the given point, adding it to the cache if it's new. If
    /// an equal point is already cached, the original coordinates are kept.
    pub fn insert(&mut self, position: Vector3<f64>) -> usize {
        let key = PointKey::new(&position);
        match self.points.get_full(&key) {
            Some((id, _, _)) => id,
            None => self.points.insert_full(key, position).0,
        }
    }

    /// Get the coordinates of a cached point. Panics if the ID didn't come
    /// from this cache.
    pub fn position(&self, id: usize) -> Vector3<f64> {
        self.points[id]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evenly divide the segment between two cached points into `steps`
    /// pieces, returning the IDs of all `steps + 1` points from `from` to
    /// `to`, inclusive. Interpolation always runs from the lower ID to the
    /// higher one, so both faces that share an edge compute bit-identical
    /// intermediate points regardless of which direction they walk it in.
    pub fn subdivide(
        &mut self,
        from: usize,
        to: usize,
        steps: usize,
    ) -> Vec<usize> {
        if steps == 0 {
            return vec![from];
        }
        if from > to {
            let mut points = self.subdivide(to, from, steps);
            points.reverse();
            return points;
        }

        let start = self.position(from);
        let delta = self.position(to) - start;
        let mut points = Vec::with_capacity(steps + 1);
        points.push(from);
        for i in 1..steps {
            let t = i as f64 / steps as f64;
            points.push(self.insert(start + delta * t));
        }
        points.push(to);
        points
    }

    /// Consume the cache, returning point coordinates indexed by ID
    pub fn into_positions(self) -> Vec<Vector3<f64>> {
        self.points.into_iter().map(|(_, position)| position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dedups() {
        let mut cache = PointCache::default();
        let a = cache.insert(Vector3::new(1.0, 0.5, 0.0));
        let b = cache.insert(Vector3::new(0.0, 0.0, 1.0));
        // Rounding noise shouldn't create a new point
        let a2 = cache.insert(Vector3::new(1.0 + 1e-12, 0.5, -1e-13));
        assert_eq!((a, b, a2), (0, 1, 0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_subdivide_shares_edge_points() {
        let mut cache = PointCache::default();
        let a = cache.insert(Vector3::new(1.0, 1.618034, 0.0));
        let b = cache.insert(Vector3::new(-1.0, 1.618034, 0.0));

        let forward = cache.subdivide(a, b, 5);
        let mut backward = cache.subdivide(b, a, 5);
        backward.reverse();

        assert_eq!(forward.len(), 6);
        assert_eq!(forward, backward);
        assert_eq!(forward.first(), Some(&a));
        assert_eq!(forward.last(), Some(&b));
        // Two endpoints plus four interior points
        assert_eq!(cache.len(), 6);
    }
}
