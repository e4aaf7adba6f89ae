use derive_more::Display;
use rand::{
    distributions::uniform::{SampleRange, SampleUniform, UniformSampler},
    RngCore,
};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A numeric type that we can build ranges of.
pub trait Rangeable: Copy + Debug + PartialOrd {
    fn zero() -> Self;
    fn one() -> Self;
}

impl Rangeable for f32 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }
}

impl Rangeable for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }
}

/// A range between two numeric values, inclusive on both ends. Used for
/// elevation bands, color components, and anywhere else we need to clamp a
/// value.
#[derive(Copy, Clone, Debug, Display, PartialEq, Serialize, Deserialize)]
#[display(fmt = "[{}, {}]", min, max)]
pub struct NumRange<T: Rangeable> {
    pub min: T,
    pub max: T,
}

impl<T: Rangeable> NumRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Get a [0,1] range for this type.
    pub fn normal_range() -> Self {
        Self::new(T::zero(), T::one())
    }

    /// Check if a value is in this range. Ranges are inclusive on both ends.
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Check if a value is in the half-open range `[min, max)`. Useful when
    /// a list of ranges tile a larger range edge-to-edge, so that each value
    /// belongs to exactly one of them.
    pub fn contains_exclusive(&self, value: T) -> bool {
        self.min <= value && value < self.max
    }

    /// Force a value into this range
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

// allow generating samples in the range
impl<T: Rangeable + SampleUniform> SampleRange<T> for NumRange<T> {
    #[inline]
    fn sample_single<R: RngCore + ?Sized>(self, rng: &mut R) -> T {
        T::Sampler::sample_single_inclusive(self.min, self.max, rng)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    #[test]
    fn test_contains() {
        let range: NumRange<f64> = NumRange::new(0.1, 0.4);
        assert!(!range.contains(0.0));
        assert!(range.contains(0.1));
        assert!(range.contains(0.4));
        assert!(!range.contains_exclusive(0.4));
        assert!(range.contains_exclusive(0.1));
    }

    #[test]
    fn test_clamp() {
        let range: NumRange<f32> = NumRange::normal_range();
        assert_approx_eq!(range.clamp(-0.5), 0.0);
        assert_approx_eq!(range.clamp(0.25), 0.25);
        assert_approx_eq!(range.clamp(3.0), 1.0);
    }

    #[test]
    fn test_sample() {
        let range: NumRange<f64> = NumRange::new(0.15, 1.0);
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..100 {
            assert!(range.contains(rng.gen_range(range)));
        }
    }
}
