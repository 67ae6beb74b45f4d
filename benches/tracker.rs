// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for cost recording.
//!
//! Run with: `cargo bench --bench tracker`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use costscope::cost::{Activity, CostTracker, Costs};
use costscope::CostConfig;

/// Benchmark a single uncontended tracker.
fn bench_tracker_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_add");
    group.throughput(Throughput::Elements(1));

    let tracker = CostTracker::new("bench");
    group.bench_function("existing_bucket", |b| {
        b.iter(|| tracker.add(black_box(42)));
    });

    let spread = CostTracker::with_bucket_size("bench", 1);
    let mut n = 0u64;
    group.bench_function("spread_buckets", |b| {
        b.iter(|| {
            n = (n + 1) % 4096;
            spread.add(black_box(n));
        });
    });

    group.finish();
}

/// Benchmark many threads hammering one activity.
fn bench_contended_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_accumulate");

    for threads in [1usize, 4, 8] {
        let per_thread = 10_000u64;
        group.throughput(Throughput::Elements(threads as u64 * per_thread));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let activity = Arc::new(Activity::new(1000));
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let activity = Arc::clone(&activity);
                        std::thread::spawn(move || {
                            for i in 0..per_thread {
                                activity.accumulate(if i % 2 == 0 { "even" } else { "odd" }, t as u64);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(activity.total_cost())
            });
        });
    }

    group.finish();
}

/// Benchmark the overhead of a timed call, enabled and disabled.
fn bench_timed_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("timed_call");
    group.throughput(Throughput::Elements(1));

    let (ctx, _) = Costs::default().scope_with(|ctx| ctx.clone());
    group.bench_function("tracking", |b| {
        b.iter(|| ctx.timed("bench", || black_box(1 + 1)));
    });

    let (disabled, _) = Costs::new(CostConfig::disabled()).scope_with(|ctx| ctx.clone());
    group.bench_function("disabled", |b| {
        b.iter(|| disabled.timed("bench", || black_box(1 + 1)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_tracker_add,
    bench_contended_accumulate,
    bench_timed_call
);
criterion_main!(benches);
