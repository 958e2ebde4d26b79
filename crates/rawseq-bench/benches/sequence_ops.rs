//! Criterion micro-benchmarks for push, insert, erase and reserve.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rawseq::Sequence;
use rawseq_bench::{apply, erase_positions, insert_positions, mixed_workload};

/// Benchmark: Push 10K values into an empty sequence.
fn bench_push_back_10k(c: &mut Criterion) {
    c.bench_function("push_back_10k", |b| {
        b.iter(|| {
            let mut seq: Sequence<u64> = Sequence::new();
            for v in 0..10_000u64 {
                seq.push_back(v);
            }
            black_box(seq.len());
        });
    });
}

/// Benchmark: Push 10K values after reserving the final capacity.
fn bench_push_back_reserved_10k(c: &mut Criterion) {
    c.bench_function("push_back_reserved_10k", |b| {
        b.iter(|| {
            let mut seq: Sequence<u64> = Sequence::with_capacity(10_000);
            for v in 0..10_000u64 {
                seq.push_back(v);
            }
            black_box(seq.len());
        });
    });
}

/// Benchmark: 1K inserts at seeded positions.
fn bench_insert_random_1k(c: &mut Criterion) {
    let positions = insert_positions(0, 1_000, 42);

    c.bench_function("insert_random_1k", |b| {
        b.iter(|| {
            let mut seq: Sequence<u64> = Sequence::new();
            for (v, &pos) in positions.iter().enumerate() {
                let _ = seq.insert(seq.cursor_at(pos), v as u64);
            }
            black_box(seq.as_ptr());
        });
    });
}

/// Benchmark: Drain a 1K sequence by erasing at seeded positions.
fn bench_erase_random_1k(c: &mut Criterion) {
    let positions = erase_positions(1_000, 42);

    c.bench_function("erase_random_1k", |b| {
        b.iter_batched(
            || (0..1_000u64).collect::<Sequence<u64>>(),
            |mut seq| {
                for &pos in &positions {
                    let _ = seq.erase(seq.cursor_at(pos));
                }
                black_box(seq.len());
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: Reserve 64K slots for a 4K sequence.
fn bench_reserve_64k(c: &mut Criterion) {
    c.bench_function("reserve_64k", |b| {
        b.iter_batched(
            || (0..4_096u64).collect::<Sequence<u64>>(),
            |mut seq| {
                seq.reserve(65_536);
                black_box(seq.capacity());
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: Replay a seeded mix of 5K operations.
fn bench_mixed_5k(c: &mut Criterion) {
    let ops = mixed_workload(5_000, 42);

    c.bench_function("mixed_5k", |b| {
        b.iter(|| {
            let mut seq: Sequence<u64> = Sequence::new();
            apply(&mut seq, &ops);
            black_box(seq.len());
        });
    });
}

criterion_group!(
    benches,
    bench_push_back_10k,
    bench_push_back_reserved_10k,
    bench_insert_random_1k,
    bench_erase_random_1k,
    bench_reserve_64k,
    bench_mixed_5k
);
criterion_main!(benches);
