use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ingest::Collection;
use matcher::{cluster, overlap_count, ClusterStrategy, SimilarityMatrix};
use serde_json::json;

fn participants(n: usize, size: usize) -> Vec<Collection> {
    (0..n)
        .map(|i| {
            let records = (0..size)
                .map(|j| json!({"prompt": format!("q{}", (i * 37 + j) % 1000), "answer": j}))
                .collect();
            Collection::from_records(format!("miner_{i:03}"), records)
        })
        .collect()
}

fn bench_overlap(c: &mut Criterion) {
    let pair = participants(2, 250);
    c.bench_function("overlap_250x250", |b| {
        b.iter(|| overlap_count(black_box(&pair[0]), black_box(&pair[1])))
    });
}

fn bench_matrix(c: &mut Criterion) {
    let collections = participants(64, 250);
    let mut group = c.benchmark_group("similarity_matrix_64");
    group.bench_function("sequential", |b| {
        b.iter(|| SimilarityMatrix::build(black_box(&collections), false))
    });
    group.bench_function("parallel", |b| {
        b.iter(|| SimilarityMatrix::build(black_box(&collections), true))
    });
    group.finish();
}

fn bench_cluster(c: &mut Criterion) {
    let collections = participants(64, 250);
    c.bench_function("cluster_greedy_64", |b| {
        b.iter(|| cluster(black_box(&collections), 100, ClusterStrategy::Greedy))
    });
}

criterion_group!(benches, bench_overlap, bench_matrix, bench_cluster);
criterion_main!(benches);
