use terrain_block_mesh::geometry::FlatTerrain;
use terrain_block_mesh::mesh_error::MeshError;
use terrain_block_mesh::mesh_generation::{
    MeshConfig, PATCH_EAST, PATCH_GROUND, PATCH_NORTH, PATCH_SOUTH, PATCH_TOP, PATCH_WEST,
    build_terrain_mesh, core_columns,
};
use terrain_block_mesh::topology::{Face, Level, PatchFaceKey, PatchType};

fn hill(x: f64, y: f64) -> f64 {
    25.0 * (-((x - 400.0).powi(2) + (y - 150.0).powi(2)) / 2e4).exp()
}

fn graded_config() -> MeshConfig {
    serde_json::from_str(
        r#"{
            "origin": [0.0, 0.0, 0.0],
            "dimensions": [800.0, 300.0, 200.0],
            "blocks": [8, 3],
            "cells": [5, 5, 12],
            "grading_x": [
                { "width": 200.0, "blocks": 4, "type": "uniform" },
                { "width": 300.0, "blocks": 2, "type": "interpolating" },
                { "type": "uniform" }
            ],
            "z_grading": 4.0,
            "spline_points": [4, 4]
        }"#,
    )
    .unwrap()
}

#[test]
fn graded_hill_from_json() {
    let cfg = graded_config();
    let mesh = build_terrain_mesh(&cfg, &hill).unwrap();
    assert_eq!(mesh.blocks().len(), 24);
    assert_eq!(mesh.points().len(), 2 * 9 * 4);

    let gx = mesh.grading(0).unwrap();
    assert_eq!(gx.boundaries.len(), 9);
    assert!(gx.widths[..4].iter().all(|w| (w - 50.0).abs() < 1e-9));
    assert!(gx.widths[6..].iter().all(|w| (w - 150.0).abs() < 1e-9));
    // the interpolating region widens between its neighbors
    assert!(gx.widths[4] < gx.widths[5]);
    assert!(mesh.grading(1).unwrap().cell_ratios.iter().all(|&r| r == 1.0));

    let grid = mesh.box_grid().unwrap();
    for i in 0..8 {
        let block = mesh.manager().block(grid.block(i, 1)).unwrap();
        let g = block.grading();
        assert_eq!(g[0], gx.cell_ratios[i]);
        assert_eq!(g[2], 4.0);
    }
    assert!(mesh.manager().block(grid.block(0, 0)).unwrap().grading_command().starts_with("simpleGrading ("));

    // ground lines: 4 along x of 8 blocks, 9 along y of 3 blocks
    assert_eq!(mesh.splines().count(), 4 * 8 + 9 * 3);
    assert!(mesh.splines().all(|s| s.inner_points().len() == 4));
}

#[test]
fn columns_stand_on_the_terrain() {
    let cfg = graded_config();
    let mesh = build_terrain_mesh(&cfg, &hill).unwrap();
    let columns = core_columns(&mesh).unwrap();
    assert_eq!(columns.len(), 9 * 4);
    for [lo, hi] in columns {
        assert_eq!(lo[2], hill(lo[0], lo[1]));
        assert_eq!((hi[0], hi[1], hi[2]), (lo[0], lo[1], 200.0));
    }
}

#[test]
fn patches_cover_the_box() {
    let mut cfg = MeshConfig::new([60.0, 40.0, 30.0], [3, 2], [2, 2, 2]);
    cfg.origin = [100.0, 200.0, 10.0];
    let mesh = build_terrain_mesh(&cfg, &FlatTerrain::new(12.0)).unwrap();
    let names: Vec<_> = mesh.patches().iter().map(|p| p.name()).collect();
    assert_eq!(
        names,
        vec![PATCH_GROUND, PATCH_TOP, PATCH_WEST, PATCH_EAST, PATCH_SOUTH, PATCH_NORTH]
    );
    assert_eq!(mesh.patch(PATCH_GROUND).unwrap().kind(), &PatchType::Wall);
    assert_eq!(mesh.patch(PATCH_SOUTH).unwrap().len(), 3);

    let east = mesh.patch(PATCH_EAST).unwrap();
    let face = east.face(PatchFaceKey(1, 0)).unwrap();
    assert_eq!(face.face, Face::East);
    assert_eq!(face.block, mesh.box_grid().unwrap().block(2, 1));
    let top = mesh.manager().point(mesh.manager().blocks()[0].corner(4)).unwrap();
    assert_eq!(top, [100.0, 200.0, 40.0]);
}

#[test]
fn periodic_sides_pair_up() {
    let mut cfg = MeshConfig::new([60.0, 40.0, 30.0], [3, 2], [2, 2, 2]);
    cfg.periodic.x = true;
    let mesh = build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)).unwrap();
    let west = mesh.patch(PATCH_WEST).unwrap();
    assert!(west.is_cyclic());
    assert_eq!(west.cyclic_partner(), Some(PATCH_EAST));
    assert_eq!(mesh.patch(PATCH_EAST).unwrap().cyclic_partner(), Some(PATCH_WEST));
    assert!(!mesh.patch(PATCH_SOUTH).unwrap().is_cyclic());
}

#[test]
fn periodic_sides_need_matching_terrain() {
    let mut cfg = MeshConfig::new([60.0, 40.0, 30.0], [3, 2], [2, 2, 2]);
    cfg.periodic.x = true;
    // the east side is twisted against the flat west side
    let twist = |x: f64, y: f64| 0.005 * x * y;
    let err = build_terrain_mesh(&cfg, &twist).unwrap_err();
    assert!(matches!(err, MeshError::Consistency(ref m) if m.contains("translation")));

    // a plain ramp only shifts the partner side
    let ramp = |x: f64, _y: f64| 0.1 * x;
    build_terrain_mesh(&cfg, &ramp).unwrap();
    cfg.periodic = Default::default();
    cfg.periodic.y = true;
    build_terrain_mesh(&cfg, &ramp).unwrap();
}

#[test]
fn blending_makes_twisted_terrain_periodic() {
    let mut cfg = MeshConfig::new([60.0, 40.0, 30.0], [3, 2], [2, 2, 2]);
    cfg.periodic.x = true;
    cfg.periodic.blend_depth = 15.0;
    let twist = |x: f64, y: f64| 0.005 * x * y;
    let mesh = build_terrain_mesh(&cfg, &twist).unwrap();

    let grid = mesh.box_grid().unwrap();
    for j in 0..=2 {
        let west = mesh.manager().point(grid.point(0, j, Level::Low)).unwrap();
        let east = mesh.manager().point(grid.point(3, j, Level::Low)).unwrap();
        assert!((west[2] - east[2]).abs() < 1e-12);
        assert!((west[2] - 0.5 * twist(60.0, west[1])).abs() < 1e-12);
    }
    // interior columns keep the original terrain
    let inner = mesh.manager().point(grid.point(1, 1, Level::Low)).unwrap();
    assert_eq!(inner[2], twist(20.0, 20.0));

    cfg.periodic.blend_depth = 31.0;
    assert!(matches!(build_terrain_mesh(&cfg, &twist), Err(MeshError::Config(_))));
}

#[test]
fn mesh_serializes_to_json() {
    let cfg = MeshConfig::new([20.0, 20.0, 10.0], [2, 1], [1, 1, 1]);
    let mesh = build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)).unwrap();
    let json = serde_json::to_value(&mesh).unwrap();
    assert_eq!(json["points"].as_array().unwrap().len(), 12);
    assert_eq!(json["blocks"].as_array().unwrap().len(), 2);
    assert_eq!(json["splines"].as_array().unwrap().len(), 0);
    let patches = json["patches"].as_array().unwrap();
    assert_eq!(patches[0]["name"], "ground");
    assert_eq!(patches[0]["kind"]["type"], "wall");
    assert_eq!(json["blocks"][0]["grading"], serde_json::json!([1.0, 1.0, 1.0]));
}

#[test]
fn bad_configs_fail_early() {
    let cfg: MeshConfig = serde_json::from_str(
        r#"{ "dimensions": [100.0, 100.0, 50.0], "blocks": [4, 4], "cells": [2, 2, 2],
             "grading_x": [ { "width": 40.0, "blocks": 4 }, {} ] }"#,
    )
    .unwrap();
    assert!(matches!(
        build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)),
        Err(MeshError::DivideByZero { region: 1, .. })
    ));

    let cfg = MeshConfig::new([100.0, 0.0, 50.0], [4, 4], [2, 2, 2]);
    assert!(matches!(
        build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)),
        Err(MeshError::Config(_))
    ));

    let cfg = MeshConfig::new([100.0, 100.0, 50.0], [2, 2], [2, 2, 2]);
    assert!(matches!(
        build_terrain_mesh(&cfg, &FlatTerrain::new(50.0)),
        Err(MeshError::InvalidGeometry(_))
    ));
}
