use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use geo::{Point, polygon};
use mpa_proximity::{
    AreaId, Config, EngineBuilder, MemoryStore, ProtectedArea, ProtectionLevel, ProximityEngine,
    Reef, ReefId, UnavailableCache,
};
use std::sync::Arc;

/// Grid of square boundaries across the Bahamas region.
fn synthetic_areas(count: usize) -> Vec<ProtectedArea> {
    (0..count)
        .map(|i| {
            let lon = -79.0 + ((i % 30) as f64) * 0.25;
            let lat = 22.0 + ((i / 30) as f64) * 0.25;
            let hw = 0.08;
            ProtectedArea {
                id: AreaId(i as u64 + 1),
                name: format!("Area {}", i + 1),
                protection: if i % 5 == 0 {
                    ProtectionLevel::NoTake
                } else {
                    ProtectionLevel::HighlyProtected
                },
                no_take: i % 5 == 0,
                boundary: polygon![
                    (x: lon - hw, y: lat - hw),
                    (x: lon + hw, y: lat - hw),
                    (x: lon + hw, y: lat + hw),
                    (x: lon - hw, y: lat + hw),
                    (x: lon - hw, y: lat - hw),
                ],
            }
        })
        .collect()
}

fn synthetic_reefs(count: usize) -> Vec<Reef> {
    (0..count)
        .map(|i| Reef {
            id: ReefId(i as u64 + 1),
            name: format!("Reef {}", i + 1),
            location: Point::new(-79.0 + ((i % 50) as f64) * 0.15, 22.0 + ((i / 50) as f64) * 0.3),
            area_id: (i % 3 == 0).then(|| AreaId((i % 200) as u64 + 1)),
        })
        .collect()
}

fn synthetic_points(count: usize) -> Vec<(u32, Point)> {
    (0..count)
        .map(|i| {
            let lon = -79.5 + ((i % 500) as f64) * 0.017;
            let lat = 21.5 + ((i / 500) as f64) * 0.21;
            (i as u32, Point::new(lon, lat))
        })
        .collect()
}

fn warmed_engine(areas: usize) -> ProximityEngine {
    let store = Arc::new(MemoryStore::with_data(
        synthetic_areas(areas),
        synthetic_reefs(500),
    ));
    EngineBuilder::new()
        .store(store)
        .warm_on_build(true)
        .build()
        .unwrap()
}

fn bench_single_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_queries");
    let engine = warmed_engine(200);

    let inside = Point::new(-78.92, 22.05);
    let open_water = Point::new(-76.0, 27.5);

    group.bench_function("containment_inside", |b| {
        b.iter(|| engine.check_containment(black_box(&inside)).unwrap())
    });

    group.bench_function("containment_miss", |b| {
        b.iter(|| engine.check_containment(black_box(&open_water)).unwrap())
    });

    group.bench_function("nearest_from_open_water", |b| {
        b.iter(|| engine.find_nearest_mpa(black_box(&open_water)).unwrap())
    });

    group.bench_function("radius_50km", |b| {
        b.iter(|| {
            engine
                .mpas_within_radius(black_box(&inside), 50.0)
                .unwrap()
        })
    });

    group.finish();
}

fn bench_context(c: &mut Criterion) {
    let mut group = c.benchmark_group("context");
    let engine = warmed_engine(200);
    let point = Point::new(-78.92, 22.05);

    group.bench_function("cached", |b| {
        engine.mpa_context(&point).unwrap();
        b.iter(|| engine.mpa_context(black_box(&point)).unwrap())
    });

    let uncached = {
        let store = Arc::new(MemoryStore::with_data(
            synthetic_areas(200),
            synthetic_reefs(500),
        ));
        EngineBuilder::new()
            .store(store)
            .cache(Arc::new(UnavailableCache))
            .warm_on_build(true)
            .build()
            .unwrap()
    };

    group.bench_function("uncached", |b| {
        b.iter(|| uncached.mpa_context(black_box(&point)).unwrap())
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_context");
    group.sample_size(10);

    for batch_size in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("workers_4", batch_size),
            &batch_size,
            |b, &n| {
                let engine = warmed_engine(200);
                let points = synthetic_points(n);
                b.iter(|| engine.mpa_context_batch(black_box(&points)).unwrap())
            },
        );
        group.bench_with_input(
            BenchmarkId::new("workers_1", batch_size),
            &batch_size,
            |b, &n| {
                let store = Arc::new(MemoryStore::with_data(
                    synthetic_areas(200),
                    synthetic_reefs(500),
                ));
                let engine = EngineBuilder::new()
                    .store(store)
                    .config(Config::default().with_batch_workers(1))
                    .warm_on_build(true)
                    .build()
                    .unwrap();
                let points = synthetic_points(n);
                b.iter(|| engine.mpa_context_batch(black_box(&points)).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_warm_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("warm_cache");

    for areas in [100usize, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(areas), &areas, |b, &n| {
            let store = Arc::new(MemoryStore::with_data(synthetic_areas(n), Vec::new()));
            let engine = EngineBuilder::new().store(store).build().unwrap();
            b.iter(|| engine.warm_cache().unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_queries,
    bench_context,
    bench_batch,
    bench_warm_cache
);
criterion_main!(benches);
