use combimap::{
    CellMarker, DartMarker, Map, Orbit, Plane, PlaneCutOptions,
    decimate::{ApproximatorKind, DecimationConfig, Decimater, SelectorKind},
    feature_edge_detection,
    use_glam::BuiltInAdaptorF32,
};
use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;
use std::hint::black_box;

type A = BuiltInAdaptorF32;

// Construction Benchmarks
fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    group.bench_function("grid_64x64", |b| {
        b.iter(|| {
            let map = Map::grid::<A>(black_box(64), black_box(64), 1.0).unwrap();
            black_box(map);
        });
    });

    group.bench_function("unit_cube_batch", |b| {
        b.iter(|| {
            for _i in 0..100 {
                let map = Map::unit_cube::<A>().unwrap();
                black_box(map);
            }
        });
    });

    group.finish();
}

// Traversal Benchmarks
fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let (map, _) = Map::grid::<A>(128, 128, 1.0).unwrap();

    for orbit in Orbit::ALL {
        group.bench_function(format!("cells_{orbit}"), |b| {
            b.iter(|| black_box(map.cells(black_box(orbit)).count()));
        });
        group.bench_function(format!("cells_coherent_{orbit}"), |b| {
            b.iter(|| black_box(map.cells_coherent(black_box(orbit)).count()));
        });
    }

    group.bench_function("triangle_indices", |b| {
        b.iter(|| black_box(map.triangle_indices(|_| true).unwrap()));
    });

    group.finish();
}

// Editing Benchmarks
fn bench_editing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editing");
    let (grid, pos) = Map::grid::<A>(64, 64, 1.0).unwrap();

    group.bench_function("cut_every_edge", |b| {
        b.iter(|| {
            let mut map = grid.clone();
            let edges: Vec<_> = map.edges().collect();
            for e in edges {
                map.cut_edge(e).unwrap();
            }
            black_box(map);
        });
    });

    group.bench_function("plane_cut", |b| {
        let plane = Plane {
            origin: Vec3::new(31.5, 0.0, 0.0),
            normal: Vec3::X,
        };
        b.iter(|| {
            let mut map = grid.clone();
            let mut marker = CellMarker::new(&map, Orbit::Face);
            let contour = map
                .plane_cut::<A>(&pos, &plane, &mut marker, &PlaneCutOptions::default())
                .unwrap();
            black_box(contour);
        });
    });

    group.bench_function("feature_edges", |b| {
        let (cube, cpos) = Map::unit_cube::<A>().unwrap();
        b.iter(|| {
            let mut marker = DartMarker::new(&cube);
            black_box(feature_edge_detection::<A>(&cube, &cpos, &mut marker, 0.5).unwrap());
        });
    });

    group.finish();
}

// Decimation Benchmarks
fn bench_decimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimation");
    group.sample_size(20);
    let (grid, pos) = Map::grid::<A>(32, 32, 1.0).unwrap();

    for (name, selector) in [
        ("edge_length", SelectorKind::EdgeLength),
        ("qem", SelectorKind::Qem),
        ("random", SelectorKind::Random { seed: 1 }),
    ] {
        let decimater = Decimater::new(DecimationConfig {
            selector,
            approximator: ApproximatorKind::MidEdge,
        });
        group.bench_function(format!("grid_half_{name}"), |b| {
            b.iter(|| {
                let mut map = grid.clone();
                decimater
                    .decimate_to_vertex_count::<A>(&mut map, &pos, black_box(500))
                    .unwrap();
                black_box(map);
            });
        });
    }

    group.finish();
}

// Serialization Benchmarks
fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");
    let (grid, _) = Map::grid::<A>(64, 64, 1.0).unwrap();
    let mut bytes = Vec::new();
    grid.save_bin(&mut bytes).unwrap();

    group.bench_function("save_bin", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            grid.save_bin(&mut out).unwrap();
            black_box(out);
        });
    });

    group.bench_function("load_bin", |b| {
        b.iter(|| black_box(Map::load_bin(black_box(bytes.as_slice())).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_traversal,
    bench_editing,
    bench_decimation,
    bench_serialization
);
criterion_main!(benches);
