//! Tectonic plate simulation. The grid is split into plates by growing them
//! outward from random seed cells, all at the same pace. Each plate is land
//! or water and drifts in some direction; where plates push into each other,
//! mountains and islands form.

use crate::{
    config::PlateConfig,
    terrain::{ElevationTarget, Generate, TerrainBuilder},
    util::{range::NumRange, tangent_frame},
};
use log::{debug, info};
use nalgebra::{Vector2, Vector3};
use rand::{seq::index, Rng};
use std::collections::VecDeque;

/// Where a cell is in the growth process
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClaimState {
    Unclaimed,
    /// Sitting in at least one plate's frontier
    Queued,
    /// Owned by the plate with this index
    Claimed(usize),
}

/// A contiguous group of cells that share an elevation and a direction of
/// drift
#[derive(Clone, Debug)]
pub struct Plate {
    center: usize,
    /// Members, in the order they were claimed
    cells: Vec<usize>,
    /// Cells to try to claim next round
    frontier: VecDeque<usize>,
    is_water: bool,
    elevation: f64,
    /// Direction of drift, in the tangent plane of each cell. Length is at
    /// most 1.
    pressure: Vector2<f64>,
    /// Members with at least one neighbour in another plate (or in none)
    edge_cells: Vec<usize>,
    /// Edge cells on the side of the plate it's drifting toward
    pressure_edge_cells: Vec<usize>,
}

impl Plate {
    pub fn center(&self) -> usize {
        self.center
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn is_water(&self) -> bool {
        self.is_water
    }

    /// Base elevation shared by all non-edge members
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn pressure(&self) -> Vector2<f64> {
        self.pressure
    }

    pub fn edge_cells(&self) -> &[usize] {
        &self.edge_cells
    }

    pub fn pressure_edge_cells(&self) -> &[usize] {
        &self.pressure_edge_cells
    }
}

/// What happened during one growth round
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundOutcome {
    pub claimed: usize,
    pub requeued: usize,
}

impl RoundOutcome {
    /// Nothing was claimed and nothing is left to try
    pub fn is_idle(&self) -> bool {
        self.claimed == 0 && self.requeued == 0
    }
}

/// The full state of a plate simulation. Generation normally runs this
/// start to finish through [PlateGenerator], but it can also be stepped
/// round by round.
#[derive(Clone, Debug)]
pub struct PlateSimulation {
    config: PlateConfig,
    sea_level: f64,
    plates: Vec<Plate>,
    states: Vec<ClaimState>,
    rounds: u32,
}

impl PlateSimulation {
    /// Seed plates on distinct random cells. If there are fewer cells than
    /// the configured plate count, every cell gets a plate.
    pub fn seed<T: ElevationTarget + ?Sized>(
        target: &T,
        config: PlateConfig,
        sea_level: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let cell_count = target.cell_count();
        let plate_count = (config.plate_count as usize).min(cell_count);
        let water_range =
            NumRange::new(0.0, (sea_level - config.land_buffer).max(0.0));
        let land_range =
            NumRange::new((sea_level + config.land_buffer).min(1.0), 1.0);

        let mut simulation = Self {
            config,
            sea_level,
            plates: Vec::with_capacity(plate_count),
            states: vec![ClaimState::Unclaimed; cell_count],
            rounds: 0,
        };
        for center in index::sample(rng, cell_count, plate_count).into_vec() {
            let is_water = rng.gen_bool(config.water_chance);
            let elevation = if is_water {
                rng.gen_range(water_range)
            } else {
                rng.gen_range(land_range)
            };
            simulation.plates.push(Plate {
                center,
                cells: Vec::new(),
                frontier: VecDeque::new(),
                is_water,
                elevation,
                pressure: random_in_disk(rng),
                edge_cells: Vec::new(),
                pressure_edge_cells: Vec::new(),
            });
            let plate = simulation.plates.len() - 1;
            simulation.claim(target, plate, center);
        }
        simulation
    }

    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    pub fn states(&self) -> &[ClaimState] {
        &self.states
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn plate_of(&self, cell: usize) -> Option<usize> {
        match self.states.get(cell) {
            Some(ClaimState::Claimed(plate)) => Some(*plate),
            _ => None,
        }
    }

    pub fn claimed_count(&self) -> usize {
        self.states
            .iter()
            .filter(|state| matches!(state, ClaimState::Claimed(_)))
            .count()
    }

    fn claim<T: ElevationTarget + ?Sized>(
        &mut self,
        target: &T,
        plate: usize,
        cell: usize,
    ) {
        self.states[cell] = ClaimState::Claimed(plate);
        self.plates[plate].cells.push(cell);
        for &neighbour in target.cell_neighbours(cell) {
            if self.states[neighbour] == ClaimState::Unclaimed {
                self.states[neighbour] = ClaimState::Queued;
            }
            if !matches!(self.states[neighbour], ClaimState::Claimed(_)) {
                self.plates[plate].frontier.push_back(neighbour);
            }
        }
    }

    /// Run one growth round. Every plate drains its frontier once, so all
    /// plates grow at the same pace. Each frontier cell is either claimed,
    /// or pushed back for next round with the configured requeue chance.
    pub fn step<T: ElevationTarget + ?Sized>(
        &mut self,
        target: &T,
        rng: &mut impl Rng,
    ) -> RoundOutcome {
        let mut outcome = RoundOutcome::default();
        let requeue_chance = self.config.chance_of_fill_requeue;
        for plate in 0..self.plates.len() {
            let pending: Vec<usize> =
                self.plates[plate].frontier.drain(..).collect();
            for cell in pending {
                if let ClaimState::Claimed(_) = self.states[cell] {
                    continue;
                }
                if requeue_chance > 0.0 && rng.gen_bool(requeue_chance) {
                    self.plates[plate].frontier.push_back(cell);
                    outcome.requeued += 1;
                } else {
                    self.claim(target, plate, cell);
                    outcome.claimed += 1;
                }
            }
        }
        self.rounds += 1;
        outcome
    }

    /// Grow until a round passes with nothing to do, or the round limit is
    /// hit
    pub fn grow<T: ElevationTarget + ?Sized>(
        &mut self,
        target: &T,
        rng: &mut impl Rng,
    ) {
        while self.rounds < self.config.max_rounds {
            if self.step(target, rng).is_idle() {
                break;
            }
        }
        debug!(
            "Plate growth stopped after {} rounds, {}/{} cells claimed",
            self.rounds,
            self.claimed_count(),
            self.states.len()
        );
    }

    /// Find each plate's edge cells, and which of those face the direction
    /// the plate is being pushed
    pub fn classify_edges<T: ElevationTarget + ?Sized>(&mut self, target: &T) {
        let max_angle = self.config.pressure_angle.to_radians();
        for index in 0..self.plates.len() {
            let center = target.cell_position(self.plates[index].center);
            let pressure = self.plates[index].pressure;
            let mut edges = Vec::new();
            let mut pressure_edges = Vec::new();

            for &cell in &self.plates[index].cells {
                let is_edge = target
                    .cell_neighbours(cell)
                    .iter()
                    .any(|&n| self.plate_of(n) != Some(index));
                if !is_edge {
                    continue;
                }
                edges.push(cell);

                let position = target.cell_position(cell);
                let (east, north) = tangent_frame(&position);
                let push: Vector3<f64> = east * pressure.x + north * pressure.y;
                let outward = position - center;
                if outward.norm() > f64::EPSILON
                    && push.norm() > f64::EPSILON
                    && outward.angle(&push) < max_angle
                {
                    pressure_edges.push(cell);
                }
            }

            let plate = &mut self.plates[index];
            plate.edge_cells = edges;
            plate.pressure_edge_cells = pressure_edges;
        }
    }

    /// Write elevations to the target: each plate's base elevation, raised
    /// where plates collide, with water plates shelving up to their shores.
    /// Cells that were never claimed are left alone.
    pub fn apply<T: ElevationTarget + ?Sized>(
        &self,
        target: &mut T,
        rng: &mut impl Rng,
    ) {
        let config = &self.config;
        let mut elevations: Vec<Option<f64>> = vec![None; self.states.len()];
        for plate in &self.plates {
            for &cell in &plate.cells {
                elevations[cell] = Some(plate.elevation);
            }
        }

        // Collisions
        for (index, plate) in self.plates.iter().enumerate() {
            for &cell in &plate.pressure_edge_cells {
                let other = target
                    .cell_neighbours(cell)
                    .iter()
                    .filter_map(|&n| self.plate_of(n))
                    .find(|&other| other != index)
                    .map(|other| self.plates[other].is_water);
                let elevation = match (plate.is_water, other) {
                    (false, Some(false)) => {
                        plate.elevation + config.mountain_height
                    }
                    (false, Some(true)) => {
                        plate.elevation + config.mountain_height / 2.0
                    }
                    (true, Some(true))
                        if rng.gen_bool(config.fault_island_chance) =>
                    {
                        self.sea_level + config.land_buffer
                    }
                    _ => plate.elevation,
                };
                elevations[cell] = Some(elevation);
            }
        }

        // Shorelines
        let shelf = (self.sea_level - config.shoreline_depth).max(0.0);
        for plate in self.plates.iter().filter(|plate| plate.is_water) {
            for &cell in &plate.edge_cells {
                let current = match elevations[cell] {
                    Some(elevation) if elevation < shelf => elevation,
                    _ => continue,
                };
                let is_shore = target.cell_neighbours(cell).iter().any(|&n| {
                    let beside_land = self
                        .plate_of(n)
                        .map_or(false, |other| !self.plates[other].is_water);
                    let above_sea =
                        elevations[n].map_or(false, |e| e > self.sea_level);
                    beside_land || above_sea
                });
                if is_shore {
                    elevations[cell] = Some(current.max(shelf));
                }
            }
        }

        for (cell, elevation) in elevations.into_iter().enumerate() {
            if let Some(elevation) = elevation {
                target.set_elevation(cell, elevation);
            }
        }
    }
}

/// Random point in the unit disk
fn random_in_disk(rng: &mut impl Rng) -> Vector2<f64> {
    loop {
        let v = Vector2::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.norm_squared() <= 1.0 {
            return v;
        }
    }
}

/// Generates terrain with [PlateSimulation]
#[derive(Debug)]
pub struct PlateGenerator(pub PlateConfig);

impl Generate for PlateGenerator {
    fn generate<T: ElevationTarget + ?Sized>(
        &self,
        builder: &mut TerrainBuilder<T>,
    ) -> anyhow::Result<()> {
        let sea_level = builder.config.sea_level;
        let target = &mut *builder.target;
        let rng = &mut builder.rng;
        let cell_count = target.cell_count();

        let mut simulation =
            PlateSimulation::seed(&*target, self.0, sea_level, rng);
        simulation.grow(&*target, rng);
        simulation.classify_edges(&*target);
        simulation.apply(target, rng);

        let water = simulation.plates().iter().filter(|p| p.is_water()).count();
        info!(
            "Grew {} plates ({} water) over {} rounds, {} cells unclaimed",
            simulation.plates().len(),
            water,
            simulation.rounds(),
            cell_count - simulation.claimed_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sphere::geodesic::Geodesic, terrain::MeshCells, Hexasphere,
        HexasphereConfig,
    };
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn sphere() -> Hexasphere {
        Hexasphere::generate(HexasphereConfig {
            divisions: 6,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_seeds_are_distinct() {
        let sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(1);
        let config = PlateConfig {
            plate_count: 40,
            ..Default::default()
        };
        let simulation = PlateSimulation::seed(&sphere, config, 0.1, &mut rng);
        assert_eq!(simulation.plates().len(), 40);
        assert_eq!(simulation.claimed_count(), 40);
        for (index, plate) in simulation.plates().iter().enumerate() {
            assert_eq!(simulation.plate_of(plate.center()), Some(index));
        }
    }

    #[test]
    fn test_more_plates_than_cells() {
        // The bare icosahedron, 12 cells
        let geodesic = Geodesic::new(1, [0.0; 3]);
        let cells = MeshCells::new(geodesic.points, &geodesic.faces).unwrap();
        let mut rng = Pcg64::seed_from_u64(1);
        let config = PlateConfig {
            plate_count: 50,
            ..Default::default()
        };
        let simulation = PlateSimulation::seed(&cells, config, 0.1, &mut rng);
        assert_eq!(simulation.plates().len(), 12);
        assert_eq!(simulation.claimed_count(), 12);
    }

    #[test]
    fn test_growth_is_monotonic_and_disjoint() {
        let sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(2);
        let mut simulation = PlateSimulation::seed(
            &sphere,
            PlateConfig::default(),
            0.1,
            &mut rng,
        );

        let mut claimed = simulation.claimed_count();
        loop {
            let outcome = simulation.step(&sphere, &mut rng);
            let now = simulation.claimed_count();
            assert_eq!(now, claimed + outcome.claimed);
            claimed = now;
            if outcome.is_idle() {
                break;
            }
            assert!(simulation.rounds() < 1000, "growth never stopped");
        }

        // Everything is reachable, so everything ends up in exactly one plate
        assert_eq!(claimed, sphere.tile_count());
        let total: usize =
            simulation.plates().iter().map(|p| p.cells().len()).sum();
        assert_eq!(total, sphere.tile_count());
    }

    #[test]
    fn test_no_requeue_is_breadth_first() {
        let sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(3);
        let config = PlateConfig {
            plate_count: 1,
            chance_of_fill_requeue: 0.0,
            ..Default::default()
        };
        let mut simulation =
            PlateSimulation::seed(&sphere, config, 0.1, &mut rng);
        let center = simulation.plates()[0].center();

        // After one round, the plate is exactly the seed plus its neighbours
        let outcome = simulation.step(&sphere, &mut rng);
        assert_eq!(outcome.requeued, 0);
        let mut cells = simulation.plates()[0].cells().to_vec();
        cells.sort_unstable();
        let mut expected = sphere.tiles()[center].neighbours().to_vec();
        expected.push(center);
        expected.sort_unstable();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_round_limit() {
        let sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(4);
        let config = PlateConfig {
            plate_count: 1,
            max_rounds: 2,
            ..Default::default()
        };
        let mut simulation =
            PlateSimulation::seed(&sphere, config, 0.1, &mut rng);
        simulation.grow(&sphere, &mut rng);
        assert_eq!(simulation.rounds(), 2);
        assert!(simulation.claimed_count() < sphere.tile_count());
    }

    #[test]
    fn test_edges() {
        let sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(5);
        let mut simulation = PlateSimulation::seed(
            &sphere,
            PlateConfig::default(),
            0.1,
            &mut rng,
        );
        simulation.grow(&sphere, &mut rng);
        simulation.classify_edges(&sphere);

        for (index, plate) in simulation.plates().iter().enumerate() {
            for &cell in plate.edge_cells() {
                assert!(sphere.tiles()[cell]
                    .neighbours()
                    .iter()
                    .any(|&n| simulation.plate_of(n) != Some(index)));
            }
            for cell in plate.pressure_edge_cells() {
                assert!(plate.edge_cells().contains(cell));
            }
        }
    }

    #[test]
    fn test_elevation_bands() {
        let mut sphere = sphere();
        let mut rng = Pcg64::seed_from_u64(6);
        let config = PlateConfig {
            // No collisions, so every cell keeps its plate's elevation,
            // except for shorelines
            pressure_angle: 0.0,
            shoreline_depth: 0.0,
            ..Default::default()
        };
        let mut simulation =
            PlateSimulation::seed(&sphere, config, 0.3, &mut rng);
        simulation.grow(&sphere, &mut rng);
        simulation.classify_edges(&sphere);
        simulation.apply(&mut sphere, &mut rng);

        for plate in simulation.plates() {
            if plate.is_water() {
                assert!(plate.elevation() <= 0.25);
            } else {
                assert!(plate.elevation() >= 0.35);
            }
            for &cell in plate.cells() {
                let elevation = sphere.tiles()[cell].extrude_amount();
                if plate.is_water() && plate.edge_cells().contains(&cell) {
                    // Shelved up to the shoreline at most
                    assert!(elevation <= 0.3 + 1e-9);
                } else {
                    assert_eq!(elevation, plate.elevation());
                }
            }
        }
    }
}
