//! Point location: finding the tile under a point or a ray.

use crate::sphere::{tile::Tile, Hexasphere};
use nalgebra::{Point3, Vector3};

/// Number of bisection steps used to find where a ray enters the base sphere
const BISECTION_STEPS: usize = 10;
/// Number of samples taken along a ray between the outer shell and the base
/// sphere, when looking for the first extruded column it passes through
const MARCH_STEPS: usize = 10;

/// Finds the tile nearest to a point by walking the tile graph, starting
/// from wherever the last lookup ended. Consecutive lookups tend to be close
/// together (e.g. a moving pointer), so most walks are a step or two.
///
/// The walk is greedy: it moves to whichever neighbour is closer to the
/// target until no neighbour improves on the current tile. The number of
/// moves is capped at the tile count, so a lookup always terminates.
///
/// [Hexasphere] keeps one of these internally. Use a separate locator with
/// [Hexasphere::tiles] to run lookups from several threads at once.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileLocator {
    last_hit: usize,
}

impl TileLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tile the last successful lookup ended on
    pub fn last_hit(&self) -> usize {
        self.last_hit
    }

    /// Find the tile whose center is nearest to the given local-space point.
    /// Only the direction of the point matters. Returns `None` if there are
    /// no tiles or the point is degenerate.
    pub fn locate(
        &mut self,
        tiles: &[Tile],
        point: &Vector3<f64>,
    ) -> Option<usize> {
        if tiles.is_empty() || !point.iter().all(|c| c.is_finite()) {
            return None;
        }
        let target = point.try_normalize(f64::EPSILON)?;
        let distance =
            |index: usize| (tiles[index].center - target).norm_squared();

        let mut current = if self.last_hit < tiles.len() {
            self.last_hit
        } else {
            0
        };
        let mut best = distance(current);
        for _ in 0..tiles.len() {
            let closer = tiles[current]
                .neighbours
                .iter()
                .map(|&neighbour| (neighbour, distance(neighbour)))
                .filter(|&(_, d)| d < best)
                .min_by(|(_, a), (_, b)| a.total_cmp(b));
            match closer {
                Some((neighbour, d)) => {
                    current = neighbour;
                    best = d;
                }
                None => break,
            }
        }

        self.last_hit = current;
        Some(current)
    }
}

/// A half-line, with an origin and a direction
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// A ray from `origin` through `target`
    pub fn through(origin: Point3<f64>, target: Point3<f64>) -> Self {
        Self::new(origin, target - origin)
    }
}

/// Find where a ray first hits a sphere centered on the origin. The
/// direction must be normalized. If the ray starts inside the sphere, this is
/// where it leaves.
fn intersect_sphere(
    origin: &Vector3<f64>,
    direction: &Vector3<f64>,
    radius: f64,
) -> Option<Vector3<f64>> {
    let b = origin.dot(direction);
    let c = origin.norm_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let t = if -b - root >= 0.0 { -b - root } else { -b + root };
    if t < 0.0 {
        None
    } else {
        Some(origin + direction * t)
    }
}

/// Follow a ray inward from where it enters the outer shell of an extruded
/// sphere (or from its origin, if it starts inside the shell), and find the
/// first tile whose column it enters.
///
/// First we bisect for the point where the ray crosses the base sphere,
/// then march from the start to that point, checking at each sample whether
/// we're below the top of the tile underneath.
fn march_columns(
    locator: &mut TileLocator,
    tiles: &[Tile],
    start: Vector3<f64>,
    direction: Vector3<f64>,
    extrude_multiplier: f64,
) -> Option<usize> {
    let range_min = 1.0;
    let range_max = start.norm_squared();
    let mut near = start;
    let mut far = start + direction;
    let mut best_point = far;
    for _ in 0..BISECTION_STEPS {
        let mid = (near + far) * 0.5;
        let distance = mid.norm_squared();
        if distance < range_min {
            far = mid;
            best_point = mid;
        } else if distance > range_max {
            far = mid;
        } else {
            near = mid;
        }
    }

    for step in 0..=MARCH_STEPS {
        let t = step as f64 / MARCH_STEPS as f64;
        let point = start.lerp(&best_point, t);
        let index = locator.locate(tiles, &point)?;
        let top = tiles[index].top_scale(extrude_multiplier);
        if point.norm_squared() < top * top {
            return Some(index);
        }
    }
    None
}

impl Hexasphere {
    /// Find the tile under a point in local space
    pub fn tile_at_local_position(
        &mut self,
        point: &Vector3<f64>,
    ) -> Option<usize> {
        self.locator.locate(&self.tiles, point)
    }

    /// Find the tile under a point in world space
    pub fn tile_at_world_position(
        &mut self,
        point: &Point3<f64>,
    ) -> Option<usize> {
        let local = self.transform.inverse_transform_point(point);
        self.tile_at_local_position(&local.coords)
    }

    /// Find the first tile a world-space ray hits. On extruded spheres,
    /// tall tiles can block the view of tiles behind them, so we look for
    /// the first column the ray enters rather than the tile at the point
    /// where it hits the base sphere. Returns `None` if the ray misses.
    pub fn tile_in_ray_direction(&mut self, ray: &Ray) -> Option<usize> {
        let origin = self.transform.inverse_transform_point(&ray.origin).coords;
        let direction = self
            .transform
            .inverse_transform_vector(&ray.direction)
            .try_normalize(f64::EPSILON)?;

        if !self.config.extruded {
            let hit = intersect_sphere(&origin, &direction, 1.0)?;
            return self.locator.locate(&self.tiles, &hit);
        }
        let multiplier = self.config.extrude_multiplier;
        let shell_radius = 1.0 + multiplier;
        // From inside the shell, the only intersection ahead is where the
        // ray leaves it, on the far side. March from the origin instead.
        let march_start =
            if origin.norm_squared() < shell_radius * shell_radius {
                origin
            } else {
                intersect_sphere(&origin, &direction, shell_radius)?
            };
        march_columns(
            &mut self.locator,
            &self.tiles,
            march_start,
            direction,
            multiplier,
        )
    }

    /// Find the tile on the opposite side of the sphere
    pub fn polar_opposite_tile(&mut self, index: usize) -> Option<usize> {
        let center = self.tiles.get(index)?.center;
        self.locator.locate(&self.tiles, &-center)
    }

    /// Get every tile whose center is closer than `distance` to the center
    /// of the given tile, in local space. The tile itself is excluded.
    pub fn tiles_within_distance(
        &self,
        index: usize,
        distance: f64,
    ) -> Vec<usize> {
        let origin = match self.tiles.get(index) {
            Some(tile) => tile.center,
            None => return Vec::new(),
        };
        let max_squared = distance * distance;

        let mut visited = vec![false; self.tiles.len()];
        visited[index] = true;
        let mut stack = vec![index];
        let mut found = Vec::new();
        while let Some(current) = stack.pop() {
            for &neighbour in &self.tiles[current].neighbours {
                if visited[neighbour] {
                    continue;
                }
                visited[neighbour] = true;
                let offset = self.tiles[neighbour].center - origin;
                if offset.norm_squared() < max_squared {
                    found.push(neighbour);
                    stack.push(neighbour);
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HexasphereConfig;

    fn sphere(extruded: bool) -> Hexasphere {
        Hexasphere::generate(HexasphereConfig {
            divisions: 4,
            extruded,
            extrude_multiplier: 0.5,
            ..Default::default()
        })
        .unwrap()
    }

    /// Brute force search, to check the walk against
    fn nearest(tiles: &[Tile], point: &Vector3<f64>) -> usize {
        let target = point.normalize();
        (0..tiles.len())
            .min_by(|&a, &b| {
                let da = (tiles[a].center - target).norm_squared();
                let db = (tiles[b].center - target).norm_squared();
                da.total_cmp(&db)
            })
            .unwrap()
    }

    #[test]
    fn test_locate_centers() {
        let sphere = sphere(false);
        let mut locator = TileLocator::new();
        for tile in sphere.tiles() {
            assert_eq!(
                locator.locate(sphere.tiles(), &tile.center()),
                Some(tile.index())
            );
            assert_eq!(locator.last_hit(), tile.index());
        }
    }

    #[test]
    fn test_locate_matches_brute_force() {
        let sphere = sphere(false);
        let mut locator = TileLocator::new();
        // Points near tile centers, nudged toward a vertex
        for tile in sphere.tiles().iter().step_by(7) {
            let point = tile.center() * 0.7 + tile.vertices()[0] * 0.3;
            assert_eq!(
                locator.locate(sphere.tiles(), &point),
                Some(nearest(sphere.tiles(), &point))
            );
        }
    }

    #[test]
    fn test_locate_degenerate() {
        let sphere = sphere(false);
        let mut locator = TileLocator::new();
        assert_eq!(locator.locate(sphere.tiles(), &Vector3::zeros()), None);
        assert_eq!(
            locator.locate(sphere.tiles(), &Vector3::new(f64::NAN, 0.0, 1.0)),
            None
        );
        assert_eq!(locator.locate(&[], &Vector3::x()), None);
    }

    #[test]
    fn test_polar_opposite() {
        let mut sphere = sphere(false);
        for index in [0, 17, 100] {
            let opposite = sphere.polar_opposite_tile(index).unwrap();
            let dot = sphere.tiles()[index]
                .center()
                .normalize()
                .dot(&sphere.tiles()[opposite].center().normalize());
            assert!(dot < -0.95, "{} -> {} ({})", index, opposite, dot);
        }
        assert_eq!(sphere.polar_opposite_tile(10_000), None);
    }

    #[test]
    fn test_ray_flat() {
        let mut sphere = sphere(false);
        let target = sphere.tiles()[60].center().normalize();
        let ray = Ray::through(Point3::from(target * 5.0), Point3::origin());
        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(60));

        let miss = Ray::new(Point3::new(0.0, 5.0, 0.0), Vector3::x());
        assert_eq!(sphere.tile_in_ray_direction(&miss), None);
        // Pointing away from the sphere
        let away = Ray::new(Point3::from(target * 5.0), target);
        assert_eq!(sphere.tile_in_ray_direction(&away), None);
    }

    #[test]
    fn test_ray_blocked_by_column() {
        let mut sphere = sphere(true);
        let target = 100;
        let blocker = sphere.tiles()[target].neighbours()[0];
        let target_point = sphere.tiles()[target].center().normalize();
        let blocker_dir = sphere.tiles()[blocker].center().normalize();
        // Look down at the target from above the neighbouring tile
        let ray = Ray::through(
            Point3::from(blocker_dir * 1.8),
            Point3::from(target_point),
        );

        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(target));
        sphere.set_tile_extrude_amount(blocker, 1.0);
        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(blocker));
    }

    #[test]
    fn test_ray_from_inside_shell() {
        let mut sphere = sphere(true);
        // Between the base sphere and the top of the tallest possible column,
        // looking straight down
        let up = sphere.tiles()[80].center().normalize();
        let origin = up * 1.2;
        let below = nearest(sphere.tiles(), &origin);
        assert_eq!(below, 80);
        let ray = Ray::new(Point3::from(origin), -up);
        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(below));

        // Starting inside a column picks that column
        sphere.set_tile_extrude_amount(below, 1.0);
        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(below));

        // Looking sideways at a tall neighbour from just above the ground
        sphere.set_tile_extrude_amount(below, 0.0);
        let neighbour = sphere.tiles()[below].neighbours()[0];
        sphere.set_tile_extrude_amount(neighbour, 1.0);
        let start = sphere.tiles()[below].center().normalize() * 1.05;
        let toward = sphere.tiles()[neighbour].center().normalize() * 1.05;
        let ray = Ray::through(Point3::from(start), Point3::from(toward));
        assert_eq!(sphere.tile_in_ray_direction(&ray), Some(neighbour));
    }

    #[test]
    fn test_within_distance() {
        let sphere = sphere(false);
        let tile = &sphere.tiles()[50];
        let steps: Vec<f64> = tile
            .neighbours()
            .iter()
            .map(|&n| (sphere.tiles()[n].center() - tile.center()).norm())
            .collect();
        let longest = steps.iter().cloned().fold(0.0, f64::max);
        let shortest = steps.iter().cloned().fold(f64::MAX, f64::min);

        // Just enough to reach the ring of neighbours
        let ring = sphere.tiles_within_distance(50, longest * 1.1);
        assert_eq!(ring.len(), 6);
        assert!(!ring.contains(&50));
        for index in &ring {
            assert!(tile.neighbours().contains(index));
        }

        assert!(sphere.tiles_within_distance(50, shortest * 0.9).is_empty());
        // Everything
        let all = sphere.tiles_within_distance(50, 3.0);
        assert_eq!(all.len(), sphere.tile_count() - 1);
        assert!(sphere.tiles_within_distance(9999, 1.0).is_empty());
    }
}
