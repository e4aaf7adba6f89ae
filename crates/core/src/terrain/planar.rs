use crate::{
    config::PlanarConfig,
    terrain::{ElevationTarget, Generate, TerrainBuilder},
};
use nalgebra::Vector3;
use rand::Rng;

/// Builds terrain by repeatedly cutting the body in half with a random plane
/// through its center, raising everything on one side and lowering the
/// other. Overlapping cuts build up into continents.
#[derive(Debug)]
pub struct PlanarGenerator(pub PlanarConfig);

impl Generate for PlanarGenerator {
    fn generate<T: ElevationTarget + ?Sized>(
        &self,
        builder: &mut TerrainBuilder<T>,
    ) -> anyhow::Result<()> {
        let config = self.0;
        let target = &mut *builder.target;
        for cell in 0..target.cell_count() {
            target.set_elevation(cell, config.default_extrusion);
        }

        for _ in 0..config.iterations {
            let normal = random_direction(&mut builder.rng);
            for cell in 0..target.cell_count() {
                let side = target.cell_position(cell).dot(&normal);
                let delta = if side > 0.0 {
                    config.raise_amount
                } else {
                    -config.raise_amount
                };
                target.set_elevation(cell, target.elevation(cell) + delta);
            }
        }
        Ok(())
    }
}

/// Uniformly distributed unit vector
fn random_direction(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        // Reject points outside the unit ball, or the result is biased
        // toward the corners of the cube
        let norm = v.norm();
        if norm > 1e-6 && norm <= 1.0 {
            return v / norm;
        }
    }
}
