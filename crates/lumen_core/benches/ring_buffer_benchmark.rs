//! # Ring Buffer Benchmark
//!
//! Steady-state emit/retire throughput of the particle ring, plus the
//! cost of growing it from a deliberately small initial capacity.
//!
//! Run with: `cargo bench --package lumen_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumen_core::RingBuffer;

/// Push one entry and retire the oldest once the live range reaches `window`.
fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_steady_state");

    for window in [64_u64, 1_024, 16_384] {
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |b, &window| {
            let mut ring: RingBuffer<u64> = RingBuffer::with_capacity(2048);
            let mut tick = 0_u64;
            b.iter(|| {
                ring.push_back(black_box(tick));
                tick += 1;
                let oldest_allowed = tick.saturating_sub(window);
                ring.pop_front_while(|&v| v < oldest_allowed);
            });
        });
    }

    group.finish();
}

/// Fill a ring starting at capacity 1 so every power of two triggers growth.
fn bench_growth(c: &mut Criterion) {
    c.bench_function("ring_growth_to_65536", |b| {
        b.iter(|| {
            let mut ring: RingBuffer<[u32; 4]> = RingBuffer::with_capacity(1);
            for i in 0..65_536_u32 {
                ring.push_back([i; 4]);
            }
            black_box(ring.capacity())
        });
    });
}

criterion_group!(benches, bench_steady_state, bench_growth);
criterion_main!(benches);
