//! Support generation benchmarks
//!
//! Run with: cargo bench

use area_support::geometry::{ExPolygon, ExPolygons, Point};
use area_support::{generate_support_areas, scale, MeshStorage, SliceDataStorage, SupportConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const LAYER_HEIGHT: f64 = 0.2;

/// A pedestal carrying a wide table top, with a few small pins hanging off it.
fn table_layers(layer_count: usize) -> Vec<ExPolygons> {
    (0..layer_count)
        .map(|l| {
            let mut outline = Vec::new();
            if l < layer_count / 2 {
                outline.push(ExPolygon::rectangle(
                    Point::new_scale(20.0, 20.0),
                    Point::new_scale(30.0, 30.0),
                ));
            } else {
                outline.push(ExPolygon::rectangle(
                    Point::new_scale(0.0, 0.0),
                    Point::new_scale(50.0, 50.0),
                ));
            }
            if l >= layer_count * 3 / 4 {
                for i in 0..4 {
                    let x = 60.0 + i as f64 * 8.0;
                    outline.push(ExPolygon::circle(Point::new_scale(x, 10.0), scale(1.0)));
                }
            }
            outline
        })
        .collect()
}

fn support_generation_benchmark(c: &mut Criterion) {
    let layers = table_layers(100);

    c.bench_function("generate_support_areas_table", |b| {
        b.iter(|| {
            let mut storage = SliceDataStorage::new(LAYER_HEIGHT, layers.len());
            storage.add_mesh(MeshStorage::new(
                "table",
                SupportConfig::enabled(),
                layers.clone(),
            ));
            generate_support_areas(&mut storage).unwrap();
            black_box(storage.support.layers.len())
        })
    });

    c.bench_function("generate_support_areas_conical", |b| {
        b.iter(|| {
            let mut storage = SliceDataStorage::new(LAYER_HEIGHT, layers.len());
            storage.add_mesh(MeshStorage::new(
                "table",
                SupportConfig::enabled().with_conical(30.0, 5.0),
                layers.clone(),
            ));
            generate_support_areas(&mut storage).unwrap();
            black_box(storage.support.layers.len())
        })
    });
}

criterion_group!(benches, support_generation_benchmark);
criterion_main!(benches);
