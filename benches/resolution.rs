//! Benchmark: Design Composition and Resolution
//!
//! Measures design building, composition, graph collection, and end-to-end
//! resolution performance.
//! Run: cargo bench --bench resolution

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use skein::provider::{from_value, to_value};
use skein::{BindingKey, Design, Injected, Resolver};
use tokio::runtime::Runtime;

/// A design with `width` instances feeding one summing provider per layer,
/// `depth` layers deep.
fn layered_design(width: usize, depth: usize) -> Design {
    let mut design = Design::new();
    for i in 0..width {
        design = design.bind_instance(format!("leaf_{i}"), i as i64);
    }
    let mut previous: Vec<String> = (0..width).map(|i| format!("leaf_{i}")).collect();
    for layer in 0..depth {
        let name = format!("layer_{layer}");
        design = design.bind_provider(name.clone(), previous.clone(), |deps| {
            let mut sum = 0i64;
            for dep in deps {
                sum += from_value::<i64>(dep)?;
            }
            Ok(to_value(sum))
        });
        previous = vec![name];
    }
    design
}

fn bench_design_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("design_building");

    group.bench_function("bind_instance_10", |b| {
        b.iter(|| {
            let mut design = Design::new();
            for i in 0..10 {
                design = design.bind_instance(format!("k{i}"), black_box(i as i64));
            }
            black_box(design)
        });
    });

    group.bench_function("bind_provider_10", |b| {
        b.iter(|| {
            let mut design = Design::new().bind_instance("base", 0i64);
            for i in 0..10 {
                design = design.bind_provider(format!("k{i}"), ["base"], |deps| {
                    Ok(deps[0].clone())
                });
            }
            black_box(design)
        });
    });

    group.finish();
}

fn bench_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");

    let base = layered_design(20, 1);
    let overlay = {
        let mut design = Design::new();
        for i in 0..10 {
            design = design.bind_instance(format!("leaf_{i}"), 100 + i as i64);
        }
        design
    };

    group.bench_function("compose_20_with_10_overlap", |b| {
        b.iter(|| black_box(base.clone() + overlay.clone()));
    });

    group.bench_function("clone_design_21", |b| {
        b.iter(|| black_box(base.clone()));
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let runtime = Runtime::new().unwrap();

    // Cold: a fresh resolver per iteration, so every provider runs.
    group.bench_function("cold_wide_20x1", |b| {
        let design = layered_design(20, 1);
        b.to_async(&runtime).iter(|| {
            let resolver = Resolver::new(design.clone());
            async move {
                let sum: i64 = resolver.resolve_key("layer_0").await.unwrap();
                black_box(sum)
            }
        });
    });

    group.bench_function("cold_deep_2x16", |b| {
        let design = layered_design(2, 16);
        b.to_async(&runtime).iter(|| {
            let resolver = Resolver::new(design.clone());
            async move {
                let sum: i64 = resolver.resolve_key("layer_15").await.unwrap();
                black_box(sum)
            }
        });
    });

    // Warm: one resolver reused, so iterations measure the cache path.
    group.bench_function("warm_cache_hit", |b| {
        let resolver = Resolver::new(layered_design(20, 4));
        b.to_async(&runtime).iter(|| async {
            let sum: i64 = resolver.resolve_key("layer_3").await.unwrap();
            black_box(sum)
        });
    });

    group.bench_function("zip_of_three_keys", |b| {
        let design = layered_design(8, 1)
            .bind_instance("a", 1i64)
            .bind_instance("b", 2i64);
        b.to_async(&runtime).iter(|| {
            let resolver = Resolver::new(design.clone());
            async move {
                let triple = Injected::<i64>::by_name("a").zip3(
                    Injected::<i64>::by_name("b"),
                    Injected::<i64>::by_name("layer_0"),
                );
                black_box(resolver.resolve(&triple).await.unwrap())
            }
        });
    });

    group.finish();
}

fn bench_key_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_creation");

    group.bench_function("interned_repeat", |b| {
        b.iter(|| black_box(BindingKey::new(black_box("database_connection"))));
    });

    group.bench_function("typed", |b| {
        b.iter(|| black_box(BindingKey::typed::<u16>(black_box("port"))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_design_building,
    bench_composition,
    bench_resolution,
    bench_key_creation,
);
criterion_main!(benches);
