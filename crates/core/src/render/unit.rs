use crate::util::range::NumRange;
use serde::{Deserialize, Serialize};

/// An RGB color. Values are stored as floats between 0 and 1 (inclusive).
/// This uses f32 because that's what vertex buffers carry anyway.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color3 {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color3 {
    /// The valid range of values for each component in RGB
    const COMPONENT_RANGE: NumRange<f32> = NumRange::new(0.0, 1.0);

    pub const WHITE: Self = Self::new_int(255, 255, 255);
    pub const BLACK: Self = Self::new_int(0, 0, 0);

    /// Create a new RGB color. Components are clamped into [0.0, 1.0].
    pub fn new(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: Self::COMPONENT_RANGE.clamp(red),
            green: Self::COMPONENT_RANGE.clamp(green),
            blue: Self::COMPONENT_RANGE.clamp(blue),
        }
    }

    /// Create a new RGB color from integer components in the [0,255] range.
    pub const fn new_int(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
        }
    }

    /// Vertex color layout, with alpha always fully opaque
    pub fn to_rgba(self) -> [f32; 4] {
        [self.red, self.green, self.blue, 1.0]
    }
}
