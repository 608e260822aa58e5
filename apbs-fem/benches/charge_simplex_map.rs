use apbs_fem::csm::{ChargeSimplexMap, LocatorKind, MapSettings};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use utilities::{construct_clustered_structure, construct_random_structure, construct_refined_mesh};

pub fn bench_build(c: &mut Criterion) {
    let atoms = construct_random_structure(4096);
    let mut group = c.benchmark_group("build");

    for cells_per_dim in [2, 4, 8].into_iter() {
        let mesh = construct_refined_mesh(cells_per_dim, 3, 2);
        for locator in [LocatorKind::Naive, LocatorKind::Bucketed] {
            let settings = MapSettings {
                locator,
                ..MapSettings::default()
            };
            let mut map = ChargeSimplexMap::construct(&atoms, &mesh, settings).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", locator), mesh.number_of_active_elements()),
                &cells_per_dim,
                |b, _| b.iter(|| map.build(black_box(&mesh))),
            );
        }
    }
    group.finish();
}

pub fn bench_update(c: &mut Criterion) {
    let atoms = construct_clustered_structure(8, 256);
    let mut group = c.benchmark_group("update");

    for cells_per_dim in [4, 8].into_iter() {
        let mesh = construct_refined_mesh(cells_per_dim, 1, 0);
        let mut refined = mesh.clone();
        let targets: Vec<usize> = refined.active_elements().step_by(2).collect();
        let pass = refined.refine(&targets).unwrap();
        let changed = pass.refined();

        // Incremental update against rebuilding over the refined mesh
        group.bench_with_input(
            BenchmarkId::new("incremental", cells_per_dim),
            &cells_per_dim,
            |b, _| {
                b.iter_batched(
                    || {
                        let mut map =
                            ChargeSimplexMap::construct(&atoms, &mesh, MapSettings::default())
                                .unwrap();
                        map.build(&mesh);
                        map
                    },
                    |mut map| map.update(black_box(&refined), black_box(&changed)).unwrap(),
                    BatchSize::SmallInput,
                )
            },
        );
        group.bench_with_input(
            BenchmarkId::new("rebuild", cells_per_dim),
            &cells_per_dim,
            |b, _| {
                let mut map =
                    ChargeSimplexMap::construct(&atoms, &refined, MapSettings::default()).unwrap();
                b.iter(|| map.build(black_box(&refined)))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_update);
criterion_main!(benches);
