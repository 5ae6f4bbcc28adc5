use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cricsummary::ingest::load_match_document;
use cricsummary::match_doc::parse_match_document;
use cricsummary::store;

fn bench_document_parse(c: &mut Criterion) {
    c.bench_function("match_document_parse", |b| {
        b.iter(|| {
            let doc = parse_match_document(black_box(ODI_JSON)).unwrap();
            black_box(doc.innings.len());
        })
    });
}

fn bench_match_id_synthesis(c: &mut Criterion) {
    let doc = parse_match_document(ODI_JSON).expect("valid fixture json");
    c.bench_function("match_id_synthesis", |b| {
        b.iter(|| {
            let id = black_box(&doc).match_id();
            black_box(id.len());
        })
    });
}

fn bench_registry_lookup(c: &mut Criterion) {
    let doc = parse_match_document(ODI_JSON).expect("valid fixture json");
    let names: Vec<String> = doc.info.players.values().flatten().cloned().collect();

    c.bench_function("registry_lookup", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for name in &names {
                if doc.info.registry.player_id(black_box(name)).is_some() {
                    hits += 1;
                }
            }
            black_box(hits);
        })
    });
}

fn bench_in_memory_load(c: &mut Criterion) {
    let doc = parse_match_document(ODI_JSON).expect("valid fixture json");
    c.bench_function("in_memory_load", |b| {
        b.iter(|| {
            let mut conn = store::open_in_memory().unwrap();
            let summary = load_match_document(&mut conn, black_box(&doc)).unwrap();
            black_box(summary.deliveries);
        })
    });
}

criterion_group!(
    perf,
    bench_document_parse,
    bench_match_id_synthesis,
    bench_registry_lookup,
    bench_in_memory_load
);
criterion_main!(perf);

static ODI_JSON: &str = include_str!("../tests/fixtures/odi_full.json");
