//! Fixed triangulations and texture coordinates for tile faces. Vertex
//! numbers refer to a tile's boundary vertices in order, followed by any
//! ridge vertices.

/// Which variant of the shaded mesh is being built
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadedMode {
    Flat,
    /// Two extra ridge vertices per tile, so the shader has something to
    /// lift towards the tile center
    Extruded,
    /// Reversed winding, for viewing from inside the sphere
    Inverted,
}

#[derive(Debug)]
pub struct ShadedTemplate {
    pub indices: &'static [u32],
    pub uvs: &'static [[f32; 2]],
    /// Extra vertices placed at the midpoint of two boundary vertices
    pub ridge: &'static [(usize, usize)],
}

impl ShadedTemplate {
    pub fn get(pentagon: bool, mode: ShadedMode) -> &'static Self {
        match (pentagon, mode) {
            (false, ShadedMode::Flat) => &HEXAGON,
            (false, ShadedMode::Extruded) => &HEXAGON_EXTRUDED,
            (false, ShadedMode::Inverted) => &HEXAGON_INVERTED,
            (true, ShadedMode::Flat) => &PENTAGON,
            (true, ShadedMode::Extruded) => &PENTAGON_EXTRUDED,
            (true, ShadedMode::Inverted) => &PENTAGON_INVERTED,
        }
    }

    /// Number of vertices a tile contributes with this template
    pub fn vertex_count(&self) -> usize {
        self.uvs.len()
    }
}

const HEXAGON_UVS: [[f32; 2]; 6] = [
    [0.0, 0.5],
    [0.25, 1.0],
    [0.75, 1.0],
    [1.0, 0.5],
    [0.75, 0.0],
    [0.25, 0.0],
];

const PENTAGON_UVS: [[f32; 2]; 5] = [
    [0.0, 0.33],
    [0.25, 1.0],
    [0.75, 1.0],
    [1.0, 0.33],
    [0.5, 0.0],
];

pub const HEXAGON: ShadedTemplate = ShadedTemplate {
    indices: &[0, 1, 5, 1, 2, 5, 4, 5, 2, 3, 4, 2],
    uvs: &HEXAGON_UVS,
    ridge: &[],
};

pub const HEXAGON_INVERTED: ShadedTemplate = ShadedTemplate {
    indices: &[0, 5, 1, 1, 5, 2, 4, 2, 5, 3, 2, 4],
    uvs: &[
        [0.0, 0.5],
        [0.25, 0.0],
        [0.75, 0.0],
        [1.0, 0.5],
        [0.75, 1.0],
        [0.25, 1.0],
    ],
    ridge: &[],
};

pub const HEXAGON_EXTRUDED: ShadedTemplate = ShadedTemplate {
    indices: &[0, 1, 6, 5, 0, 6, 1, 2, 5, 4, 5, 2, 2, 3, 7, 3, 4, 7],
    uvs: &[
        HEXAGON_UVS[0],
        HEXAGON_UVS[1],
        HEXAGON_UVS[2],
        HEXAGON_UVS[3],
        HEXAGON_UVS[4],
        HEXAGON_UVS[5],
        [0.25, 0.5],
        [0.75, 0.5],
    ],
    ridge: &[(1, 5), (2, 4)],
};

pub const PENTAGON: ShadedTemplate = ShadedTemplate {
    indices: &[0, 1, 4, 1, 2, 4, 3, 4, 2],
    uvs: &PENTAGON_UVS,
    ridge: &[],
};

pub const PENTAGON_INVERTED: ShadedTemplate = ShadedTemplate {
    indices: &[0, 4, 1, 1, 4, 2, 3, 2, 4],
    uvs: &[
        [0.0, 0.66],
        [0.25, 0.0],
        [0.75, 0.0],
        [1.0, 0.66],
        [0.5, 1.0],
    ],
    ridge: &[],
};

pub const PENTAGON_EXTRUDED: ShadedTemplate = ShadedTemplate {
    indices: &[0, 1, 5, 4, 0, 5, 1, 2, 4, 2, 3, 6, 3, 4, 6],
    uvs: &[
        PENTAGON_UVS[0],
        PENTAGON_UVS[1],
        PENTAGON_UVS[2],
        PENTAGON_UVS[3],
        PENTAGON_UVS[4],
        [0.375, 0.5],
        [0.625, 0.5],
    ],
    ridge: &[(1, 4), (2, 4)],
};
