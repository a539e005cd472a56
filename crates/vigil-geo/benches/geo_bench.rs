//! Benchmarks for the geo hot path: exact distance vs. coarse bbox
//! pre-filter, and polygon membership.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vigil_core::Coordinate;
use vigil_geo::{bounding_box, distance_km, point_in_polygon, within_radius};

fn coord(lon: f64, lat: f64) -> Coordinate {
    Coordinate::new(lon, lat).unwrap()
}

fn bench_distance(c: &mut Criterion) {
    let a = coord(106.8456, -6.2088);
    let b = coord(107.6191, -6.9175);

    c.bench_function("haversine_distance", |bench| {
        bench.iter(|| distance_km(black_box(a), black_box(b)))
    });
}

fn bench_two_phase_filter(c: &mut Criterion) {
    let center = coord(106.8, -6.2);
    let radius = 10.0;
    let bbox = bounding_box(center, radius);

    let points: Vec<Coordinate> = (0..1000)
        .map(|i| {
            let step = i as f64 * 0.001;
            coord(106.0 + step, -6.5 + step * 0.5)
        })
        .collect();

    c.bench_function("exact_only_filter", |bench| {
        bench.iter(|| {
            points
                .iter()
                .filter(|p| within_radius(**p, center, radius))
                .count()
        })
    });

    c.bench_function("bbox_then_exact_filter", |bench| {
        bench.iter(|| {
            points
                .iter()
                .filter(|p| bbox.contains(**p) && within_radius(**p, center, radius))
                .count()
        })
    });
}

fn bench_point_in_polygon(c: &mut Criterion) {
    let ring: Vec<Coordinate> = (0..32)
        .map(|i| {
            let angle = i as f64 / 32.0 * std::f64::consts::TAU;
            coord(angle.cos() * 5.0, angle.sin() * 5.0)
        })
        .collect();
    let point = coord(1.0, 1.0);

    c.bench_function("point_in_polygon_32", |bench| {
        bench.iter(|| point_in_polygon(black_box(point), black_box(&ring)))
    });
}

criterion_group!(benches, bench_distance, bench_two_phase_filter, bench_point_in_polygon);
criterion_main!(benches);
