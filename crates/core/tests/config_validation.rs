use hexasphere::{
    Hexasphere, HexasphereConfig, PathfindingConfig, PlateConfig,
    TerrainConfig, TerrainGenerator,
};
use validator::ValidationErrors;

fn error_fields(err: anyhow::Error) -> Vec<&'static str> {
    let validation_errors = err.downcast::<ValidationErrors>().unwrap();
    let mut fields = validation_errors
        .errors()
        .keys()
        .copied()
        .collect::<Vec<&str>>();
    fields.sort_unstable();
    fields
}

#[test]
fn test_sphere_config_validation() {
    let config = HexasphereConfig {
        divisions: 1,              // invalid (too small)
        extrude_multiplier: 2.0,   // invalid
        max_vertices_per_chunk: 4, // invalid (can't fit a tile)
        pathfinding: PathfindingConfig {
            search_limit: 0, // invalid
            ..Default::default()
        },
        ..Default::default()
    };

    let err = Hexasphere::generate(config).unwrap_err();
    assert_eq!(
        error_fields(err),
        vec![
            "divisions",
            "extrude_multiplier",
            "max_vertices_per_chunk",
            "pathfinding"
        ]
    );
}

#[test]
fn test_terrain_config_validation() {
    let mut sphere = Hexasphere::generate(HexasphereConfig {
        divisions: 3,
        ..Default::default()
    })
    .unwrap();

    let config = TerrainConfig {
        sea_level: 1.5, // invalid
        ..Default::default()
    };
    let err = sphere.apply_terrain(&config).unwrap_err();
    assert_eq!(error_fields(err), vec!["sea_level"]);

    let config = TerrainConfig {
        generator: TerrainGenerator::TectonicPlates(PlateConfig {
            plate_count: 0,              // invalid
            chance_of_fill_requeue: 1.0, // invalid, growth could stall
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = sphere.apply_terrain(&config).unwrap_err();
    assert_eq!(
        error_fields(err),
        vec!["chance_of_fill_requeue", "plate_count"]
    );
}
