use terrain_block_mesh::geometry::FlatTerrain;
use terrain_block_mesh::geometry::vector::distance;
use terrain_block_mesh::mesh_error::MeshError;
use terrain_block_mesh::mesh_generation::cylinder::propagate_section_distances;
use terrain_block_mesh::mesh_generation::{
    BoxSide, CylinderBlockKey, CylinderConfig, CylinderPointKey, MeshConfig, PATCH_GROUND, PATCH_OUTER,
    build_terrain_mesh,
};
use terrain_block_mesh::topology::{Face, Level};

fn ring(radius: f64, sub_sections: Vec<usize>) -> CylinderConfig {
    CylinderConfig {
        radius,
        sub_sections,
        first_section_start_direction: [-1.0, -1.0, 0.0],
        radial_blocks: 4,
        radial_cells: 3,
        radial_grading: 1.0,
        linear_fraction: 0.5,
        arc_points: 5,
    }
}

fn square(cylinder: CylinderConfig) -> MeshConfig {
    let mut cfg = MeshConfig::new([100.0, 100.0, 50.0], [2, 2], [4, 4, 4]);
    cfg.cylinder = Some(cylinder);
    cfg
}

#[test]
fn walk_points_connect_to_slots_in_order() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    assert_eq!(topo.slot_count(), 8);
    let slots: Vec<_> = (0..8).map(|n| topo.connection(n).unwrap()).collect();
    assert_eq!(slots, (0..8).collect::<Vec<_>>());
    assert!((0..4).all(|s| topo.is_explicit(s).unwrap()));
    assert!((topo.core_extent() - 50.0 * 2f64.sqrt()).abs() < 1e-9);
}

#[test]
fn corner_spokes_reach_every_circle() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    let radii = topo.radii();
    assert_eq!(radii.len(), 5);
    assert!((radii[4] - 150.0).abs() < 1e-9);
    for s in 0..4 {
        for (n, d) in topo.section_distances(s).unwrap().iter().enumerate() {
            assert!((d - (radii[n] - topo.core_extent())).abs() < 1e-9);
        }
    }

    let centre = [50.0, 50.0, 0.0];
    for s in 0..4 {
        for u in 0..2 {
            for n in topo.linear_layer()..=4 {
                let id = topo.point(CylinderPointKey::new(s, u, n, Level::Low)).unwrap();
                let p = mesh.manager().point(id).unwrap();
                assert!((distance(p, centre) - radii[n]).abs() < 1e-6, "({s}, {u}, {n})");
            }
        }
    }
}

#[test]
fn ring_shares_points_with_the_core() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    let grid = mesh.box_grid().unwrap();
    for level in Level::BOTH {
        assert_eq!(topo.point(CylinderPointKey::new(0, 0, 0, level)), Some(grid.point(0, 0, level)));
        assert_eq!(topo.point(CylinderPointKey::new(1, 1, 0, level)), Some(grid.point(2, 1, level)));
    }
    // the end spoke of a section is the start spoke of the next one
    for n in 0..=4 {
        assert_eq!(
            topo.point(CylinderPointKey::new(0, 2, n, Level::High)),
            topo.point(CylinderPointKey::new(1, 0, n, Level::High))
        );
    }
}

#[test]
fn ring_blocks_close_around_the_core() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    let grid = mesh.box_grid().unwrap();
    assert_eq!(topo.block_count(), 32);
    assert_eq!(mesh.blocks().len(), 36);
    assert_eq!(mesh.patch(PATCH_OUTER).unwrap().len(), 8);
    assert_eq!(mesh.patch(PATCH_GROUND).unwrap().len(), 36);

    let first = topo
        .block(CylinderBlockKey {
            side: BoxSide::South,
            i: 0,
            j: 0,
            radial: 0,
        })
        .unwrap();
    let bm = mesh.manager();
    assert_eq!(bm.block(first).unwrap().neighbor(Face::South), Some(grid.block(0, 0)));
    // the south-west core block feeds two columns
    assert!(topo
        .block(CylinderBlockKey {
            side: BoxSide::West,
            i: 0,
            j: 0,
            radial: 3,
        })
        .is_some());

    let run = bm.block_run(first, Face::East, None).unwrap();
    assert!(run.is_closed());
    assert_eq!(run.len(), 8);
    let out = bm.block_run(first, Face::North, None).unwrap();
    assert_eq!(out.len(), 4);
}

#[test]
fn arcs_on_circular_layers() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    // layers 2..=4, eight slots, ground and top
    assert_eq!(mesh.splines().count(), 3 * 8 * 2);
    for s in mesh.splines() {
        assert_eq!(s.inner_points().len(), 5);
        let r = distance(s.inner_points()[2], [50.0, 50.0, s.inner_points()[2][2]]);
        assert!((distance(s.first_point(), [50.0, 50.0, s.first_point()[2]]) - r).abs() < 1e-6);
    }
}

#[test]
fn hill_ring_follows_the_terrain() {
    let hill = |x: f64, y: f64| 10.0 * (-((x - 50.0).powi(2) + (y - 50.0).powi(2)) / 2e3).exp();
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &hill).unwrap();
    // core lines, arcs, radial ground edges, transition ring ground edges
    assert_eq!(mesh.splines().count(), 12 + 48 + 32 + 8);
    for s in mesh.splines() {
        s.validate(mesh.manager().points()).unwrap();
    }
}

#[test]
fn radius_inside_the_core_is_rejected() {
    let err = build_terrain_mesh(&square(ring(60.0, vec![2, 2, 2, 2])), &FlatTerrain::new(0.0)).unwrap_err();
    assert!(matches!(err, MeshError::Config(_)));
}

#[test]
fn slot_count_must_match_the_walk() {
    let err = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2])), &FlatTerrain::new(0.0)).unwrap_err();
    assert!(matches!(err, MeshError::Topology(_)));
}

#[test]
fn spokes_turning_back_are_rejected() {
    // seven subsections crowd half the circle while one spans the other half
    let err = build_terrain_mesh(&square(ring(150.0, vec![7, 1])), &FlatTerrain::new(0.0)).unwrap_err();
    assert!(matches!(err, MeshError::Topology(ref m) if m.contains("degrees")));
}

#[test]
fn start_direction_snaps_to_the_nearest_corner() {
    let mut cyl = ring(150.0, vec![2, 2, 2, 2]);
    cyl.first_section_start_direction = [1.0, -0.2, 0.0];
    let mesh = build_terrain_mesh(&square(cyl), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    // section 0 starts on the south-east corner, walk point 2
    assert_eq!(topo.connection(2), Some(0));
    assert_eq!(topo.connection(1), Some(7));
    assert!((0..4).all(|s| topo.is_explicit(s).unwrap()));
}

#[test]
fn uneven_subsections_keep_the_walk_order() {
    let mesh = build_terrain_mesh(&square(ring(150.0, vec![1, 3, 2, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    assert!((0..8).all(|n| topo.connection(n) == Some(n)));
    let explicit: Vec<_> = (0..4).map(|s| topo.is_explicit(s).unwrap()).collect();
    assert_eq!(explicit, vec![true, false, true, true]);
    let (filled, pinned) = (topo.section_distances(1).unwrap(), topo.section_distances(0).unwrap());
    assert!(filled.iter().zip(pinned).all(|(d, p)| (d - p).abs() < 1e-9));
    assert!(topo.is_explicit(4).is_err());
}

fn rectangle(cylinder: CylinderConfig) -> MeshConfig {
    let mut cfg = MeshConfig::new([200.0, 100.0, 50.0], [4, 2], [4, 4, 4]);
    cfg.cylinder = Some(CylinderConfig {
        first_section_start_direction: [-2.0, -1.0, 0.0],
        ..cylinder
    });
    cfg
}

#[test]
fn rectangle_sides_match_their_sections() {
    let mesh = build_terrain_mesh(&rectangle(ring(300.0, vec![4, 2, 4, 2])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    assert!((0..12).all(|n| topo.connection(n) == Some(n)));
    assert!((0..4).all(|s| topo.is_explicit(s).unwrap()));
    assert_eq!(topo.block_count(), 12 * 4);
    assert_eq!(mesh.blocks().len(), 8 + 48);
}

#[test]
fn rectangle_fills_sections_between_corners() {
    let mesh = build_terrain_mesh(&rectangle(ring(300.0, vec![3, 3, 3, 3])), &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    let explicit: Vec<_> = (0..4).map(|s| topo.is_explicit(s).unwrap()).collect();
    assert_eq!(explicit, vec![true, false, true, false]);
    // both pinned sections start on a corner of the extent circle
    let pinned = topo.section_distances(0).unwrap().to_vec();
    for s in [1, 3] {
        for (d, p) in topo.section_distances(s).unwrap().iter().zip(&pinned) {
            assert!((d - p).abs() < 1e-9);
        }
    }

    let centre = [100.0, 50.0, 0.0];
    let radii = topo.radii();
    for s in 0..4 {
        for u in 0..3 {
            let r: Vec<f64> = (0..radii.len())
                .map(|n| {
                    let id = topo.point(CylinderPointKey::new(s, u, n, Level::Low)).unwrap();
                    distance(mesh.manager().point(id).unwrap(), centre)
                })
                .collect();
            assert!(r.windows(2).all(|w| w[0] < w[1]), "({s}, {u}): {r:?}");
            for n in topo.linear_layer()..radii.len() {
                assert!((r[n] - radii[n]).abs() < 1e-6);
            }
        }
    }
}

#[test]
fn many_subsections_on_a_large_core() {
    let mut cfg = MeshConfig::new([160.0, 160.0, 50.0], [16, 16], [2, 2, 2]);
    cfg.cylinder = Some(ring(200.0, vec![16; 4]));
    let mesh = build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)).unwrap();
    let topo = mesh.cylinder().unwrap();
    assert_eq!(topo.slot_count(), 64);
    assert!((0..64).all(|n| topo.connection(n) == Some(n)));
    assert!((0..4).all(|s| topo.is_explicit(s).unwrap()));
    assert_eq!(topo.block_count(), 64 * 4);
}

#[test]
fn ring_terrain_must_stay_below_the_top() {
    let plateau = |x: f64, y: f64| if (x - 50.0).hypot(y - 50.0) > 80.0 { 70.0 } else { 0.0 };
    let err = build_terrain_mesh(&square(ring(150.0, vec![2, 2, 2, 2])), &plateau).unwrap_err();
    assert!(matches!(err, MeshError::InvalidGeometry(_)));
}

#[test]
fn periodic_sides_exclude_a_cylinder() {
    let mut cfg = square(ring(150.0, vec![2, 2, 2, 2]));
    cfg.periodic.y = true;
    assert!(matches!(
        build_terrain_mesh(&cfg, &FlatTerrain::new(0.0)),
        Err(MeshError::Config(_))
    ));
}

#[test]
fn single_explicit_section_extends_constant() {
    let d = propagate_section_distances(&[None, Some(vec![0.0, 4.0, 9.0]), None, None], 3).unwrap();
    assert!(d.iter().all(|s| s == &vec![0.0, 4.0, 9.0]));

    let d = propagate_section_distances(&[Some(vec![2.0]), None, Some(vec![2.0]), None], 1).unwrap();
    assert!(d.iter().all(|s| (s[0] - 2.0).abs() < 1e-12));
}
