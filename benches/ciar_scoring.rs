//! Benchmarks `CiarScorer`'s component math (§4.5): the hot path every
//! promoted fact and every L2 retrieve runs through.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memory_core::ciar::CiarScorer;
use memory_core::types::{CiarComponents, CiarConfig};

fn bench_score(c: &mut Criterion) {
    let scorer = CiarScorer::new(CiarConfig::default());
    let components = CiarComponents {
        certainty: 0.9,
        impact: 0.8,
        age_decay: 0.95,
        recency_boost: 1.2,
    };

    c.bench_function("ciar_score", |b| {
        b.iter(|| scorer.score(black_box(&components)).unwrap());
    });
}

fn bench_rescore(c: &mut Criterion) {
    let scorer = CiarScorer::new(CiarConfig::default());
    let extracted_at = Utc::now() - chrono::Duration::days(3);

    c.bench_function("ciar_rescore", |b| {
        b.iter(|| scorer.rescore(black_box(0.9), black_box(0.8), extracted_at, black_box(4)).unwrap());
    });
}

fn bench_age_decay(c: &mut Criterion) {
    let scorer = CiarScorer::new(CiarConfig::default());
    c.bench_function("ciar_age_decay", |b| {
        b.iter(|| scorer.age_decay(black_box(7.0)));
    });
}

criterion_group!(benches, bench_score, bench_rescore, bench_age_decay);
criterion_main!(benches);
