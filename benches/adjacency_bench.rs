use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use terrain_block_mesh::algs::adjacency::match_faces;
use terrain_block_mesh::geometry::FlatTerrain;
use terrain_block_mesh::mesh_generation::{CylinderConfig, MeshConfig, build_terrain_mesh};

fn square(n: usize) -> MeshConfig {
    MeshConfig::new([10.0 * n as f64, 10.0 * n as f64, 50.0], [n, n], [4, 4, 4])
}

fn bench_adjacency(c: &mut Criterion) {
    let mut group = c.benchmark_group("adjacency");

    for &n in &[8usize, 32, 64] {
        let mesh = build_terrain_mesh(&square(n), &FlatTerrain::new(0.0)).unwrap();
        let blocks = mesh.blocks().to_vec();

        group.bench_with_input(BenchmarkId::new("match_faces", n), &blocks, |b, blocks| {
            b.iter(|| match_faces(blocks).unwrap());
        });

        let manager = mesh.manager().clone();
        group.bench_with_input(BenchmarkId::new("find_all_neighbors", n), &manager, |b, bm| {
            b.iter(|| {
                let mut bm = bm.clone();
                bm.find_all_neighbors().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let hill = |x: f64, y: f64| 5.0 * (-((x - 80.0).powi(2) + (y - 80.0).powi(2)) / 2e3).exp();

    let plain = square(16);
    group.bench_function("core_16x16", |b| {
        b.iter(|| build_terrain_mesh(&plain, &hill).unwrap())
    });

    let mut ringed = square(8);
    ringed.cylinder = Some(CylinderConfig {
        radius: 200.0,
        sub_sections: vec![8, 8, 8, 8],
        first_section_start_direction: [-1.0, -1.0, 0.0],
        radial_blocks: 6,
        radial_cells: 4,
        radial_grading: 2.0,
        linear_fraction: 0.5,
        arc_points: 8,
    });
    group.bench_function("cylinder_8x8", |b| {
        b.iter(|| build_terrain_mesh(&ringed, &hill).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_adjacency, bench_build);
criterion_main!(benches);
