//! A* search over the tile graph.
//!
//! Every move into a tile costs 1, so a path's cost is its length in steps
//! unless a [PathCost] adds more. Tiles that can't be crossed, or whose group
//! doesn't intersect the query's group mask, can't be entered at all.

use crate::{
    config::HeuristicFormula,
    sphere::{tile::Tile, Hexasphere},
};
use fnv::FnvHashMap;
use log::trace;
use nalgebra::Vector3;
use std::{cmp::Ordering, collections::BinaryHeap};

/// Group mask that matches every tile
pub const ALL_GROUPS: u32 = !0;

/// Extra cost for entering a tile, on top of the base cost of 1 per step.
/// Return `None` to make the tile impassable. Negative costs are treated as
/// zero, so the search heuristic stays admissible.
pub trait PathCost {
    fn cost(&self, tile: &Tile) -> Option<f64>;
}

impl<F: Fn(&Tile) -> Option<f64>> PathCost for F {
    fn cost(&self, tile: &Tile) -> Option<f64> {
        self(tile)
    }
}

/// The largest distance between neighbouring tile centers, as both a chord
/// length and an angle. Dividing by these turns a distance into a lower bound
/// on the number of steps it takes to cover it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct StepScale {
    chord: f64,
    angle: f64,
}

impl StepScale {
    pub fn measure(tiles: &[Tile]) -> Self {
        let mut scale = Self {
            chord: f64::EPSILON,
            angle: f64::EPSILON,
        };
        for tile in tiles {
            for &neighbour in &tile.neighbours {
                let other = &tiles[neighbour].center;
                scale.chord = scale.chord.max((tile.center - other).norm());
                scale.angle = scale.angle.max(tile.center.angle(other));
            }
        }
        scale
    }

    /// Estimate the number of steps between two tile centers. Never
    /// overestimates, except for [HeuristicFormula::EuclideanNoSqr], which
    /// trades that for speed.
    fn estimate(
        &self,
        formula: HeuristicFormula,
        from: &Vector3<f64>,
        to: &Vector3<f64>,
    ) -> f64 {
        match formula {
            HeuristicFormula::SphericalDistance => from.angle(to) / self.angle,
            HeuristicFormula::Euclidean => (from - to).norm() / self.chord,
            HeuristicFormula::EuclideanNoSqr => {
                (from - to).norm_squared() / (self.chord * self.chord)
            }
        }
    }
}

/// A search state: a tile, and how many steps it took to get there. With a
/// cost hook, a cheap route to a tile can use more steps than a pricier one,
/// and only the pricier one may reach the goal within the step limit, so
/// both have to be kept. Without a hook, cost and steps are the same thing
/// and the step count is always 0 here.
type StateKey = (usize, u32);

/// Book-keeping for one visited state
#[derive(Copy, Clone, Debug)]
struct PathNode {
    /// Cost of the best known path from the start
    cost: f64,
    steps: u32,
    parent: Option<StateKey>,
    closed: bool,
}

/// An entry in the open set. Ordered so that [BinaryHeap], a max-heap, pops
/// the lowest score first.
#[derive(Copy, Clone, Debug, PartialEq)]
struct QueueItem {
    score: f64,
    key: StateKey,
}

impl Eq for QueueItem {}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One path query
pub(crate) struct PathFinder<'a> {
    pub tiles: &'a [Tile],
    pub scale: StepScale,
    pub formula: HeuristicFormula,
    /// Nodes this many steps from the start aren't expanded further
    pub step_limit: u32,
    pub group_mask: u32,
    pub cost: Option<&'a dyn PathCost>,
}

impl<'a> PathFinder<'a> {
    fn can_enter(&self, tile: &Tile) -> Option<f64> {
        if !tile.can_cross || tile.group & self.group_mask == 0 {
            return None;
        }
        match self.cost {
            Some(cost) => cost.cost(tile).map(|extra| 1.0 + extra.max(0.0)),
            None => Some(1.0),
        }
    }

    fn key(&self, tile: usize, steps: u32) -> StateKey {
        if self.cost.is_some() {
            (tile, steps)
        } else {
            (tile, 0)
        }
    }

    /// Find the cheapest path from `start` to `goal` that takes no more than
    /// the step limit. The path includes the goal but not the start. Both
    /// indices must be valid and distinct.
    pub fn find(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let goal_center = &self.tiles[goal].center;
        let estimate = |tile: usize| {
            self.scale
                .estimate(self.formula, &self.tiles[tile].center, goal_center)
        };

        let mut nodes: FnvHashMap<StateKey, PathNode> = FnvHashMap::default();
        // (steps, cost) of every state reached so far, per tile. A new state
        // is only worth exploring if no known one is both shorter and cheaper.
        let mut reached: FnvHashMap<usize, Vec<(u32, f64)>> =
            FnvHashMap::default();
        let mut open = BinaryHeap::new();
        let start_key = self.key(start, 0);
        nodes.insert(
            start_key,
            PathNode {
                cost: 0.0,
                steps: 0,
                parent: None,
                closed: false,
            },
        );
        reached.insert(start, vec![(0, 0.0)]);
        open.push(QueueItem {
            score: estimate(start),
            key: start_key,
        });

        while let Some(QueueItem { key, .. }) = open.pop() {
            let node = match nodes.get_mut(&key) {
                Some(node) if !node.closed => {
                    node.closed = true;
                    *node
                }
                // Stale entry, this state was already reached more cheaply
                _ => continue,
            };
            let (tile, _) = key;
            if tile == goal {
                trace!("Path search visited {} states", nodes.len());
                return Some(Self::unwind(&nodes, key));
            }
            if node.steps >= self.step_limit {
                continue;
            }

            let steps = node.steps + 1;
            for &neighbour in &self.tiles[tile].neighbours {
                let step_cost = match self.can_enter(&self.tiles[neighbour]) {
                    Some(step_cost) => step_cost,
                    None => continue,
                };
                let cost = node.cost + step_cost;
                let known = reached.entry(neighbour).or_default();
                if known.iter().any(|&(s, c)| s <= steps && c <= cost) {
                    continue;
                }
                let neighbour_key = self.key(neighbour, steps);
                if nodes.get(&neighbour_key).map_or(false, |n| n.closed) {
                    continue;
                }
                known.push((steps, cost));
                nodes.insert(
                    neighbour_key,
                    PathNode {
                        cost,
                        steps,
                        parent: Some(key),
                        closed: false,
                    },
                );
                open.push(QueueItem {
                    score: cost + estimate(neighbour),
                    key: neighbour_key,
                });
            }
        }

        trace!("No path found after visiting {} states", nodes.len());
        None
    }

    fn unwind(
        nodes: &FnvHashMap<StateKey, PathNode>,
        goal: StateKey,
    ) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = goal;
        while let Some(parent) = nodes.get(&current).and_then(|n| n.parent) {
            path.push(current.0);
            current = parent;
        }
        path.reverse();
        path
    }
}

impl Hexasphere {
    fn path_finder<'a>(
        &'a self,
        search_limit: u32,
        group_mask: u32,
        cost: Option<&'a dyn PathCost>,
    ) -> PathFinder<'a> {
        PathFinder {
            tiles: &self.tiles,
            scale: self.step_scale,
            formula: self.config.pathfinding.heuristic,
            step_limit: if search_limit == 0 {
                self.config.pathfinding.search_limit
            } else {
                search_limit
            },
            group_mask,
            cost,
        }
    }

    /// Find the shortest path between two tiles. The path lists every tile
    /// entered along the way, ending with the goal; the start is left out, so
    /// a path from a tile to itself is empty.
    ///
    /// Paths longer than `search_limit` steps aren't found. Pass 0 to use the
    /// limit from the config. Only tiles in one of the groups in `group_mask`
    /// can be entered, use [ALL_GROUPS] to allow any.
    ///
    /// Returns `None` if either index is invalid or there is no path.
    pub fn find_path(
        &self,
        start: usize,
        goal: usize,
        search_limit: u32,
        group_mask: u32,
    ) -> Option<Vec<usize>> {
        self.find_path_inner(start, goal, search_limit, group_mask, None)
    }

    /// [Self::find_path], with an extra cost for each tile entered
    pub fn find_path_with_cost(
        &self,
        start: usize,
        goal: usize,
        search_limit: u32,
        group_mask: u32,
        cost: &dyn PathCost,
    ) -> Option<Vec<usize>> {
        self.find_path_inner(start, goal, search_limit, group_mask, Some(cost))
    }

    fn find_path_inner(
        &self,
        start: usize,
        goal: usize,
        search_limit: u32,
        group_mask: u32,
        cost: Option<&dyn PathCost>,
    ) -> Option<Vec<usize>> {
        if start >= self.tiles.len() || goal >= self.tiles.len() {
            return None;
        }
        if start == goal {
            return Some(Vec::new());
        }
        self.path_finder(search_limit, group_mask, cost)
            .find(start, goal)
    }

    /// Get every tile that can be reached from the given tile in at most
    /// `max_steps` steps. The tile itself is excluded.
    pub fn tiles_within_steps(
        &self,
        index: usize,
        max_steps: u32,
        group_mask: u32,
    ) -> Vec<usize> {
        if index >= self.tiles.len() || max_steps == 0 {
            return Vec::new();
        }
        let finder = self.path_finder(max_steps, group_mask, None);

        let mut queued = vec![false; self.tiles.len()];
        queued[index] = true;
        let mut candidates = Vec::new();
        for &neighbour in &self.tiles[index].neighbours {
            queued[neighbour] = true;
            candidates.push(neighbour);
        }

        let mut found = Vec::new();
        while let Some(candidate) = candidates.pop() {
            if finder.find(index, candidate).is_none() {
                continue;
            }
            found.push(candidate);
            for &neighbour in &self.tiles[candidate].neighbours {
                if !queued[neighbour] {
                    queued[neighbour] = true;
                    candidates.push(neighbour);
                }
            }
        }
        found
    }
}
