use criterion::{Criterion, criterion_group, criterion_main};
use ridesim::{
    animator::Traversal,
    routing::Route,
    shared::geo::{Coordinate, distance_km},
};
use std::{hint::black_box, time::Duration};

fn haversine() {
    let _ = black_box(distance_km(
        black_box(106.660_172),
        black_box(10.762_622),
        black_box(106.700_806),
        black_box(10.776_889),
    ));
}

/// A zig-zag route of `points` waypoints roughly 100 m apart.
fn zig_zag(points: usize) -> Route {
    (0..points)
        .map(|i| {
            let step = i as f64 * 0.001;
            let wobble = if i % 2 == 0 { 0.0 } else { 0.0005 };
            Coordinate::from((10.0 + wobble, 106.0 + step))
        })
        .collect::<Vec<_>>()
        .into()
}

fn traverse(route: &Route) {
    let mut traversal = Traversal::new(route.clone());
    // One tick at 25 km/h
    while let Some(position) = traversal.advance(25.0 / 36_000.0) {
        black_box(traversal.remaining(position));
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let short = zig_zag(20);
    let long = zig_zag(2_000);

    let mut group = c.benchmark_group("Animation");

    group.measurement_time(Duration::from_secs(10));

    group.bench_function("Haversine distance", |b| b.iter(haversine));

    group.bench_function("Short route traversal", |b| b.iter(|| traverse(&short)));

    group.bench_function("Long route traversal", |b| b.iter(|| traverse(&long)));

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
