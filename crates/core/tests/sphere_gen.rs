use hexasphere::{tile_count, Hexasphere, HexasphereConfig, Style};

fn generate(divisions: u32) -> Hexasphere {
    Hexasphere::generate(HexasphereConfig {
        divisions,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_sphere_gen_default() {
    let sphere = Hexasphere::generate(HexasphereConfig::default()).unwrap();
    assert_eq!(sphere.tile_count(), 642);
    assert_eq!(sphere.pentagon_count(), 12);
}

#[test]
fn test_tile_counts() {
    for divisions in 2..=10 {
        let sphere = generate(divisions);
        assert_eq!(sphere.tile_count(), tile_count(divisions));
        assert_eq!(sphere.pentagon_count(), 12, "divisions = {}", divisions);
    }
}

/// Neighbour lists have to agree with each other, or paths could be one-way
#[test]
fn test_neighbours_are_symmetric() {
    let sphere = generate(7);
    for tile in sphere.tiles() {
        assert_eq!(tile.neighbours().len(), tile.vertices().len());
        for &neighbour in tile.neighbours() {
            assert_ne!(neighbour, tile.index());
            assert!(
                sphere.tiles()[neighbour]
                    .neighbours()
                    .contains(&tile.index()),
                "{} -> {} is one-way",
                tile.index(),
                neighbour
            );
        }
    }
}

#[test]
fn test_generation_is_deterministic() {
    let config = HexasphereConfig {
        divisions: 6,
        rotation: [10.0, 20.0, 30.0],
        ..Default::default()
    };
    let a = Hexasphere::generate(config).unwrap();
    let b = Hexasphere::generate(config).unwrap();
    for (a, b) in a.tiles().iter().zip(b.tiles()) {
        assert_eq!(a.center(), b.center());
        assert_eq!(a.neighbours(), b.neighbours());
    }
}

#[test]
fn test_rotation_moves_pentagons() {
    let plain = generate(3);
    let rotated = Hexasphere::generate(HexasphereConfig {
        divisions: 3,
        rotation: [0.0, 45.0, 0.0],
        ..Default::default()
    })
    .unwrap();
    assert_eq!(rotated.tile_count(), plain.tile_count());
    assert_ne!(rotated.tiles()[0].center(), plain.tiles()[0].center());
}

#[test]
fn test_chunks_respect_ceiling() {
    for style in [Style::Shaded, Style::Wireframe, Style::ShadedWireframe] {
        for extruded in [false, true] {
            let config = HexasphereConfig {
                divisions: 12,
                style,
                extruded,
                max_vertices_per_chunk: 500,
                ..Default::default()
            };
            let sphere = Hexasphere::generate(config).unwrap();
            let mesh = sphere.mesh();
            assert_eq!(mesh.shaded().is_empty(), !style.has_shaded());
            assert_eq!(mesh.wireframe().is_empty(), !style.has_wireframe());

            for chunk in mesh.shaded().iter().chain(mesh.wireframe()) {
                assert!(chunk.vertex_count() <= 500);
                assert!(chunk
                    .indices()
                    .iter()
                    .all(|&i| (i as usize) < chunk.vertex_count()));
            }
            // Every tile lands in exactly one chunk per layer
            for chunks in [mesh.shaded(), mesh.wireframe()] {
                if chunks.is_empty() {
                    continue;
                }
                let covered: usize =
                    chunks.iter().map(|chunk| chunk.tiles().len()).sum();
                assert_eq!(covered, sphere.tile_count());
            }
        }
    }
}
