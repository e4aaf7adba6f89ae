//! Terrain from images. Maps are sampled by the latitude and longitude of
//! each cell, using an equirectangular projection: x runs west to east
//! starting at longitude -180°, and row 0 is the south pole.

use crate::{
    render::unit::Color3,
    terrain::ElevationTarget,
    util::range::NumRange,
};
use anyhow::{ensure, Context};
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Water masks mark water with values below this
const WATER_MASK_THRESHOLD: f32 = 16.0 / 255.0;

/// A grid of samples in `[0, 1]`, stored row by row
#[derive(Clone, Debug, PartialEq)]
pub struct HeightMap {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl HeightMap {
    pub fn new(
        width: usize,
        height: usize,
        samples: Vec<f32>,
    ) -> anyhow::Result<Self> {
        check_size(width, height, samples.len())?;
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the sample under a position on the sphere
    pub fn sample(&self, position: &Vector3<f64>) -> f32 {
        let (x, y) = pixel(position, self.width, self.height);
        self.samples[y * self.width + x]
    }
}

/// A grid of colors, stored row by row
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    width: usize,
    height: usize,
    pixels: Vec<Color3>,
}

impl ColorMap {
    pub fn new(
        width: usize,
        height: usize,
        pixels: Vec<Color3>,
    ) -> anyhow::Result<Self> {
        check_size(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn sample(&self, position: &Vector3<f64>) -> Color3 {
        let (x, y) = pixel(position, self.width, self.height);
        self.pixels[y * self.width + x]
    }
}

fn check_size(width: usize, height: usize, len: usize) -> anyhow::Result<()> {
    ensure!(width > 0 && height > 0, "map can't be empty");
    ensure!(
        width * height == len,
        "{}x{} map needs {} samples, got {}",
        width,
        height,
        width * height,
        len
    );
    Ok(())
}

/// Find the pixel that a position on the sphere falls on
fn pixel(
    position: &Vector3<f64>,
    width: usize,
    height: usize,
) -> (usize, usize) {
    let p = position.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::y);
    let latitude = p.y.clamp(-1.0, 1.0).asin();
    let longitude = -p.x.atan2(p.z);

    let x = ((longitude + PI) / (2.0 * PI) * width as f64) as usize;
    let y = ((latitude + PI / 2.0) / PI * height as f64) as usize;
    (x.min(width - 1), y.min(height - 1))
}

/// Options for [apply_height_map]
#[derive(Clone, Debug)]
pub struct HeightMapOptions<'a> {
    /// Samples at or below this are water
    pub sea_level: f64,
    /// Colors for elevations from 0 to 1, evenly spaced
    pub ramp: &'a [Color3],
    /// Optional extra water mask, using the same layout as the height map
    pub water_mask: Option<&'a HeightMap>,
}

/// Set the elevation and color of every cell from a height map. Water cells
/// are flattened to 0 and can't be crossed.
pub fn apply_height_map<T: ElevationTarget + ?Sized>(
    target: &mut T,
    map: &HeightMap,
    options: &HeightMapOptions,
) -> anyhow::Result<()> {
    ensure!(!options.ramp.is_empty(), "color ramp is empty");
    let last_color = options.ramp.len() - 1;
    for cell in 0..target.cell_count() {
        let position = target.cell_position(cell);
        let sample =
            NumRange::normal_range().clamp(map.sample(&position) as f64);
        let masked = options.water_mask.map_or(false, |mask| {
            mask.sample(&position) < WATER_MASK_THRESHOLD
        });
        let is_water = sample <= options.sea_level || masked;
        let elevation = if is_water { 0.0 } else { sample };

        let color_index = (last_color as f64 * elevation).round() as usize;
        let color = options
            .ramp
            .get(color_index)
            .with_context(|| format!("no ramp color {}", color_index))?;
        target.set_elevation(cell, elevation);
        target.set_color(cell, *color);
        target.set_can_cross(cell, !is_water);
    }
    Ok(())
}

/// Color every cell from the color map
pub fn apply_color_map<T: ElevationTarget + ?Sized>(
    target: &mut T,
    map: &ColorMap,
) {
    for cell in 0..target.cell_count() {
        let color = map.sample(&target.cell_position(cell));
        target.set_color(cell, color);
    }
}
