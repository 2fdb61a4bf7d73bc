//! Criterion benchmarks for the rate-aggregation hot path.

use criterion::{criterion_group, criterion_main, Criterion};
use netspeed_tester::models::{Sample, TransferTotals};
use netspeed_tester::rate::RateAggregator;
use std::hint::black_box;
use std::time::{Duration, Instant};

fn make_samples(count: usize) -> Vec<Sample> {
    let mut total = 0u64;
    (1..=count)
        .map(|i| {
            let bytes = ((i as u64 * 37) % 200_000) + 50_000;
            total += bytes;
            Sample {
                at: Instant::now(),
                bytes,
                total_bytes: total,
                elapsed: Duration::from_millis(150 * i as u64),
            }
        })
        .collect()
}

fn bench_aggregator_push(c: &mut Criterion) {
    let samples = make_samples(400);
    c.bench_function("aggregator_push_400_samples", |b| {
        b.iter(|| {
            let mut agg = RateAggregator::new(Duration::from_millis(1500), 0.3);
            for sample in &samples {
                black_box(agg.push(sample));
            }
        })
    });
}

fn bench_aggregator_finalize(c: &mut Criterion) {
    let samples = make_samples(400);
    let mut agg = RateAggregator::new(Duration::from_millis(1500), 0.3);
    let mut total = 0u64;
    for sample in &samples {
        agg.push(sample);
        total = sample.total_bytes;
    }
    let totals = TransferTotals {
        bytes: total,
        elapsed: Duration::from_millis(150 * samples.len() as u64),
        failed_connections: 0,
    };
    c.bench_function("aggregator_finalize", |b| {
        b.iter(|| black_box(agg.finalize(&totals, 0.15, Duration::from_millis(500)).unwrap()))
    });
}

criterion_group!(benches, bench_aggregator_push, bench_aggregator_finalize);
criterion_main!(benches);
