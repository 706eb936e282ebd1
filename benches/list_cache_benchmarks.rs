//! # List Cache Benchmarks
//!
//! Key derivation and point mutation throughput.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::time::Duration;

use list_cache::caching::{CacheKey, CacheStore, ListQuery, Pagination, Record};

/// Build a store with `pages` cached pages of 20 records each
fn create_populated_store(pages: usize) -> CacheStore<Record> {
    let store = CacheStore::with_ttl(Duration::from_secs(300));
    for page in 0..pages {
        let items = (0..20)
            .map(|i| Record::new(format!("rec-{}", (page * 10 + i) % 500)).with("name", "x"))
            .collect();
        store.set(
            CacheKey::from(format!("page-{}", page)),
            items,
            Pagination::new(500, page as u32 + 1, 20),
        );
    }
    store
}

fn benchmark_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    let query = ListQuery::new()
        .page(3)
        .limit(20)
        .search("copper")
        .status("pending")
        .filter("cityId", "city-42")
        .filter("location", json!({"lat": 18.52, "lng": 73.85}));

    group.bench_function("list_query", |b| b.iter(|| black_box(&query).cache_key()));

    let params = query.to_params();
    group.bench_function("raw_params", |b| b.iter(|| CacheKey::from_params(black_box(&params))));

    group.finish();
}

fn benchmark_point_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_mutations");

    for &pages in &[10usize, 100, 1000] {
        let store = create_populated_store(pages);
        let patch = json!({"name": "y"}).as_object().cloned().unwrap();

        group.bench_with_input(BenchmarkId::new("update_entity", pages), &pages, |b, _| {
            b.iter(|| store.update_entity(black_box("rec-42"), &patch))
        });

        group.bench_with_input(BenchmarkId::new("get_hit", pages), &pages, |b, _| {
            let key = CacheKey::from("page-0");
            b.iter(|| store.get(black_box(&key)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_key_derivation, benchmark_point_mutations);
criterion_main!(benches);
