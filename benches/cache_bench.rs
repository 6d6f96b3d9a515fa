//! Benchmarks for the cache-aside layer over the in-process store.
//!
//! Run with: cargo bench

use cache_aside::{Cache, CacheConfig, MemoryStore, Options, Populate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::convert::Infallible;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn opts(i: usize) -> Options {
    Options::new().key(format!("key_{}", i)).expire(300)
}

/// Benchmark immediate reads and writes.
fn bench_immediate(c: &mut Criterion) {
    let mut group = c.benchmark_group("immediate");
    let rt = runtime();

    let cache = Cache::new(MemoryStore::new());

    // Pre-populate some keys
    rt.block_on(async {
        for i in 0..10_000 {
            cache.set(&opts(i), &format!("value_{}", i)).await.unwrap();
        }
    });

    group.bench_function("get_existing", |b| {
        let mut i = 0;
        b.iter(|| {
            let value = rt.block_on(cache.get::<String>(&opts(i % 10_000)));
            black_box(value.unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let missing = Options::new().key("missing").expire(300);
        b.iter(|| {
            black_box(rt.block_on(cache.get::<String>(&missing)).unwrap());
        });
    });

    group.bench_function("set", |b| {
        let mut i = 0;
        b.iter(|| {
            rt.block_on(cache.set(&opts(i % 10_000), "updated_value"))
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark get-or-compute on a hot key and on fresh keys.
fn bench_cache_aside(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_aside");
    let rt = runtime();

    let config = CacheConfig::new().populate(Populate::Awaited).build();
    let cache = Cache::with_config(MemoryStore::new(), config);

    group.bench_function("get_with_hit", |b| {
        let hot = opts(0);
        b.iter(|| {
            let value: u64 = rt
                .block_on(cache.get_with(&hot, || async { Ok::<_, Infallible>(42u64) }))
                .unwrap();
            black_box(value);
        });
    });

    group.bench_function("get_with_miss", |b| {
        let mut i = 1;
        b.iter(|| {
            let value: u64 = rt
                .block_on(cache.get_with(&opts(i), || async { Ok::<_, Infallible>(42u64) }))
                .unwrap();
            black_box(value);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark batches of increasing size against one command per call.
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let rt = runtime();

    let cache = Cache::new(MemoryStore::new());

    for size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("batched_set", size), size, |b, &size| {
            b.iter(|| {
                let mut batch = cache.pipeline();
                for i in 0..size {
                    batch.set(&opts(i), &i).unwrap();
                }
                black_box(rt.block_on(batch.run()).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("immediate_set", size), size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    for i in 0..size {
                        cache.set(&opts(i), &i).await.unwrap();
                    }
                });
            });
        });
    }

    group.finish();
}

/// Benchmark concurrent hash increments.
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    let rt = runtime();

    for num_tasks in [2, 4, 8].iter() {
        let cache = Cache::new(MemoryStore::new());

        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(
            BenchmarkId::new("hincr", num_tasks),
            num_tasks,
            |b, &num_tasks| {
                b.iter(|| {
                    rt.block_on(async {
                        let handles: Vec<_> = (0..num_tasks)
                            .map(|t| {
                                let cache = cache.clone();
                                tokio::spawn(async move {
                                    let opts = Options::new()
                                        .key("counters")
                                        .field(format!("task_{}", t))
                                        .expire(300);
                                    for _ in 0..1000 / num_tasks {
                                        black_box(cache.hincr(&opts).await.unwrap());
                                    }
                                })
                            })
                            .collect();

                        for handle in handles {
                            handle.await.unwrap();
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_immediate,
    bench_cache_aside,
    bench_pipeline,
    bench_concurrent,
);
criterion_main!(benches);
