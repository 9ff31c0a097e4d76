//! Criterion micro-benchmarks for token resolution, label lookup,
//! materialization and provider rebuilds.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use condor_bench::{
    label, reference_interval, reference_providers, reference_record, REFERENCE_PROVIDERS,
    REFERENCE_TRANSITION,
};

/// Benchmark: cached reads of every provider through tokens.
fn bench_token_get_cached(c: &mut Criterion) {
    let (record, tokens) = reference_record(REFERENCE_PROVIDERS).unwrap();
    let view = record.record(REFERENCE_TRANSITION).unwrap();
    for token in &tokens {
        view.get(token).get().unwrap();
    }

    c.bench_function("token_get_cached_64", |b| {
        b.iter(|| {
            for token in &tokens {
                black_box(view.get(token).ok());
            }
        });
    });
}

/// Benchmark: the same reads through label lookup.
fn bench_label_get_cached(c: &mut Criterion) {
    let (record, _tokens) = reference_record(REFERENCE_PROVIDERS).unwrap();
    let view = record.record(REFERENCE_TRANSITION).unwrap();
    let labels: Vec<String> = (0..REFERENCE_PROVIDERS).map(label).collect();
    for l in &labels {
        view.get_by_label::<u64>(l).get().unwrap();
    }

    c.bench_function("label_get_cached_64", |b| {
        b.iter(|| {
            for l in &labels {
                black_box(view.get_by_label::<u64>(l).ok());
            }
        });
    });
}

/// Benchmark: new interval, then first access of every provider.
fn bench_interval_rematerialize(c: &mut Criterion) {
    let (mut record, tokens) = reference_record(REFERENCE_PROVIDERS).unwrap();
    let mut first = 1_u64;

    c.bench_function("interval_rematerialize_64", |b| {
        b.iter(|| {
            first += 1000;
            record.set_validity_interval(reference_interval(first)).unwrap();
            let view = record.record(REFERENCE_TRANSITION).unwrap();
            for token in &tokens {
                black_box(view.get(token).ok());
            }
        });
    });
}

/// Benchmark: replacing the provider set and rebuilding the token table.
fn bench_rebuild(c: &mut Criterion) {
    let (mut record, _tokens) = reference_record(REFERENCE_PROVIDERS).unwrap();

    c.bench_function("rebuild_64", |b| {
        b.iter(|| {
            record.rebuild(reference_providers(REFERENCE_PROVIDERS)).unwrap();
            black_box(record.cache_identifier());
        });
    });
}

criterion_group!(
    benches,
    bench_token_get_cached,
    bench_label_get_cached,
    bench_interval_rematerialize,
    bench_rebuild
);
criterion_main!(benches);
