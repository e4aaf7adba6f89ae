//! Hover and click tracking, for callers that want tile-level pointer events
//! rather than raw locate results.

use strum::Display;

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum TileEvent {
    /// The pointer moved onto a tile
    Enter(usize),
    /// The pointer left a tile
    Exit(usize),
    Click(usize),
}

/// Remembers which tile the pointer is over. Feed it the result of every
/// pointer lookup, e.g. [Hexasphere::tile_in_ray_direction], and it turns
/// changes into events.
///
/// [Hexasphere::tile_in_ray_direction]: crate::Hexasphere::tile_in_ray_direction
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerTracker {
    hovered: Option<usize>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Record the tile now under the pointer, if any. The exit event for the
    /// old tile comes before the enter event for the new one.
    pub fn update(&mut self, hit: Option<usize>) -> Vec<TileEvent> {
        if hit == self.hovered {
            return Vec::new();
        }
        let events = self
            .hovered
            .map(TileEvent::Exit)
            .into_iter()
            .chain(hit.map(TileEvent::Enter))
            .collect();
        self.hovered = hit;
        events
    }

    /// A click lands on whatever tile is hovered
    pub fn click(&self) -> Option<TileEvent> {
        self.hovered.map(TileEvent::Click)
    }

    /// Forget the hovered tile, e.g. after the sphere is regenerated
    pub fn reset(&mut self) -> Option<TileEvent> {
        self.hovered.take().map(TileEvent::Exit)
    }
}
