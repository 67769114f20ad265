use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use visite_geo::{
    GeoPoint, MarkerIdx,
    cluster::{DEFAULT_CLUSTER_RADIUS_PX, cluster_markers},
    nearest::nearest_neighbor,
};

fn random_points(count: usize) -> Vec<GeoPoint> {
    let mut rng = SmallRng::seed_from_u64(42);
    (0..count)
        .map(|_| GeoPoint::new(rng.random_range(19.0..37.0), rng.random_range(-8.0..12.0)))
        .collect()
}

fn nearest_benchmark(c: &mut Criterion) {
    let points = random_points(10_000);

    c.bench_function("nearest_neighbor 10k", |b| {
        b.iter(|| nearest_neighbor(black_box(MarkerIdx::new(5_000)), black_box(&points)))
    });
}

fn cluster_benchmark(c: &mut Criterion) {
    let points = random_points(10_000);

    c.bench_function("cluster_markers 10k zoom 6", |b| {
        b.iter(|| cluster_markers(black_box(&points), 6.0, DEFAULT_CLUSTER_RADIUS_PX))
    });

    c.bench_function("cluster_markers 10k zoom 12", |b| {
        b.iter(|| cluster_markers(black_box(&points), 12.0, DEFAULT_CLUSTER_RADIUS_PX))
    });
}

criterion_group!(benches, nearest_benchmark, cluster_benchmark);
criterion_main!(benches);
