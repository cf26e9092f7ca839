//! # luckyblock Benchmarks
//!
//! | Area | Operation | Expectation |
//! |------|-----------|-------------|
//! | Scoring | `compute_score` | four sha256 rounds, sub-microsecond scale |
//! | Fork choice | `select_winner` | near-linear in candidate count |
//! | Pool | `remainder` | dominated by the hash sort |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use luckyblock::test_utils::test_txn;
use luckyblock::{compute_score, select_winner, BlockDraft, BlockTypeConfig, TransactionPool};
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

// ============================================================================
// Scoring
// ============================================================================

fn bench_compute_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let parent = "a".repeat(64);

    group.bench_function("compute_score", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let peer = format!("QmPeer{}", rng.gen::<u32>());
            black_box(compute_score(&peer, &parent))
        })
    });

    group.finish();
}

// ============================================================================
// Fork choice
// ============================================================================

fn bench_select_winner(c: &mut Criterion) {
    let mut group = c.benchmark_group("fork-choice");
    group.measurement_time(Duration::from_secs(5));

    let config = BlockTypeConfig::default();
    let genesis = BlockDraft::new(&config, None, "QmGenesis")
        .seal()
        .expect("genesis seals");

    for size in [4usize, 32, 256] {
        let candidates: Vec<_> = (0..size)
            .map(|i| {
                BlockDraft::new(&config, Some(&genesis), &format!("QmPeer{i}"))
                    .seal()
                    .expect("candidate seals")
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &candidates, |b, cs| {
            b.iter(|| black_box(select_winner(cs)))
        });
    }

    group.finish();
}

// ============================================================================
// Pool
// ============================================================================

fn bench_pool_remainder(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool");

    for size in [100usize, 10_000] {
        let pool = TransactionPool::new();
        for i in 0..size {
            pool.log_transaction(test_txn("exchange", &format!("tx-{i:08}")));
        }
        let confirmed: HashSet<_> = (0..size / 2).map(|i| format!("tx-{i:08}")).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("remainder", size), &confirmed, |b, ex| {
            b.iter(|| black_box(pool.remainder(ex)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_score,
    bench_select_winner,
    bench_pool_remainder
);
criterion_main!(benches);
