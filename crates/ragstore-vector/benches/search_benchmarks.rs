//! Benchmarks for brute-force search and bulk ingestion.
//!
//! Uses 1,000 chunks by default. Set `BENCH_FULL_SCALE=1` to run against
//! 100,000 chunks:
//!
//! ```bash
//! BENCH_FULL_SCALE=1 cargo bench -p ragstore-vector
//! ```

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use ragstore_vector::embedding::{EmbeddingProvider, MockEmbedding};
use ragstore_vector::{DistanceMetric, Document, VectorStore};

const CI_CHUNK_COUNT: usize = 1_000;

const FULL_SCALE_CHUNK_COUNT: usize = 100_000;

/// Each chunk is made unique by its index so MockEmbedding yields distinct vectors.
fn generate_chunk_text(index: usize) -> String {
    format!(
        "The deployment pipeline ran successfully across all three environments \
         including staging, production, and disaster recovery. Database migrations \
         were applied without any downtime. Chunk identifier: {}",
        index
    )
}

fn chunk_count() -> usize {
    if std::env::var("BENCH_FULL_SCALE").is_ok() {
        FULL_SCALE_CHUNK_COUNT
    } else {
        CI_CHUNK_COUNT
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
}

fn documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let metadata = json!({ "chunk_index": i, "source": format!("doc-{}.txt", i % 7) });
            let metadata = metadata.as_object().cloned().unwrap_or_default();
            Document::new(generate_chunk_text(i), metadata)
        })
        .collect()
}

fn build_populated_store(
    rt: &tokio::runtime::Runtime,
    metric: DistanceMetric,
    count: usize,
) -> VectorStore {
    let store = rt
        .block_on(
            VectorStore::new(metric)
                .with_embedder(MockEmbedding::new())
                .expect("attach failed")
                .build_from_collection(documents(count)),
        )
        .expect("build failed");
    assert_eq!(store.len(), count, "Store should contain all chunks");
    store
}

fn bench_search(c: &mut Criterion) {
    let count = chunk_count();
    let rt = runtime();
    let query = rt
        .block_on(MockEmbedding::new().embed_one("database migration downtime"))
        .expect("query embed failed");

    let mut group = c.benchmark_group("search");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(10));

    for metric in [DistanceMetric::Cosine, DistanceMetric::Euclidean] {
        let store = build_populated_store(&rt, metric, count);

        group.bench_with_input(
            BenchmarkId::new(format!("{}_top10", metric), count),
            &query,
            |b, query| {
                b.iter(|| {
                    let hits = store.search_scored(query, 10).expect("search failed");
                    assert_eq!(hits.len(), 10);
                    hits
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new(format!("{}_top10_metadata", metric), count),
            &query,
            |b, query| {
                b.iter(|| store.search_with_metadata(query, 10).expect("search failed"));
            },
        );
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let count = chunk_count().min(CI_CHUNK_COUNT);
    let rt = runtime();

    let mut group = c.benchmark_group("build_from_collection");
    group.sample_size(20);

    group.bench_function(format!("mock_{}chunks", count), |b| {
        b.iter(|| build_populated_store(&rt, DistanceMetric::Cosine, count));
    });

    group.finish();
}

criterion_group!(benches, bench_search, bench_build);
criterion_main!(benches);
