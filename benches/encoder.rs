//! Benchmarks for message encoding and decoding.
//!
//! Measures the construction protocol end to end:
//! - Flat tables of scalar fields
//! - Tables with nested strings, tables and vectors
//! - Scalar and string vectors
//! - Cancelled containers
//! - Zero-copy decoding of a finished message

extern crate linearbuffers;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use linearbuffers::prelude::*;
use std::hint::black_box;

const CT: CountType = CountType::Uint32;
const OT: OffsetType = OffsetType::Uint32;

/// Encodes `{ id: u64 @0, score: f64 @8, flags: u32 @16, name: string @20, tags: [string] @24 }`.
fn encode_record(encoder: &mut Encoder, id: u64) -> Result<Handle> {
    encoder.table_start(CT, OT, 5, 28)?;
    encoder.table_set(0, 0, id)?;
    encoder.table_set(1, 8, id as f64 * 0.5)?;
    encoder.table_set(2, 16, 0xF0F0_u32)?;
    encoder.table_create_string(3, 20, "record name")?;
    let tags = encoder.vector_create_string(CT, OT, &["alpha", "beta", "gamma"])?;
    encoder.table_set_vector(4, 24, tags)?;
    encoder.table_end()
}

/// Benchmark encoding a single flat table of ten scalar fields.
fn bench_flat_table(c: &mut Criterion) {
    c.bench_function("encode_flat_table", |b| {
        b.iter(|| {
            let mut encoder = Encoder::new();
            encoder.table_start(CT, OT, 10, 80).unwrap();
            for field in 0..10u64 {
                encoder
                    .table_set(field, field * 8, black_box(field))
                    .unwrap();
            }
            black_box(encoder.table_end().unwrap())
        });
    });
}

/// Benchmark encoding a root table holding a vector of 100 nested records.
fn bench_nested_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_nested");
    group.throughput(Throughput::Elements(100));

    group.bench_function("records_100", |b| {
        b.iter(|| {
            let mut encoder = Encoder::new();
            encoder.table_start(CT, OT, 1, 4).unwrap();
            let records: Vec<Handle> = (0..100)
                .map(|id| encode_record(&mut encoder, black_box(id)).unwrap())
                .collect();
            let list = encoder.vector_create_table(CT, OT, &records).unwrap();
            encoder.table_set_vector(0, 0, list).unwrap();
            black_box(encoder.table_end().unwrap())
        });
    });

    group.finish();
}

/// Benchmark encoding large scalar vectors, which exercises page growth of the sink.
fn bench_scalar_vector(c: &mut Criterion) {
    let values: Vec<u32> = (0..64 * 1024).collect();

    let mut group = c.benchmark_group("encode_vector");
    group.throughput(Throughput::Bytes((values.len() * 4) as u64));

    group.bench_function("u32_64k", |b| {
        b.iter(|| {
            let mut encoder = Encoder::new();
            black_box(
                encoder
                    .vector_create(CT, OT, black_box(values.as_slice()))
                    .unwrap(),
            )
        });
    });

    group.bench_function("u32_64k_page_64k", |b| {
        b.iter(|| {
            let options: EncoderOptions = EncoderOptions::new().with_page_size(64 * 1024);
            let mut encoder = Encoder::with_options(options).unwrap();
            black_box(
                encoder
                    .vector_create(CT, OT, black_box(values.as_slice()))
                    .unwrap(),
            )
        });
    });

    group.finish();
}

/// Benchmark building and cancelling a record, then reusing the reclaimed space.
fn bench_cancel(c: &mut Criterion) {
    c.bench_function("encode_cancel_reuse", |b| {
        let mut encoder = Encoder::new();
        b.iter(|| {
            encoder.table_start(CT, OT, 2, 8).unwrap();
            encoder.table_create_string(0, 0, "discarded").unwrap();
            encoder.table_cancel().unwrap();
            black_box(encode_record(&mut encoder, 1).unwrap());
            encoder.reset().unwrap();
        });
    });
}

/// Benchmark reading every field of 100 nested records back.
fn bench_decode(c: &mut Criterion) {
    let mut encoder = Encoder::new();
    encoder.table_start(CT, OT, 1, 4).unwrap();
    let records: Vec<Handle> = (0..100)
        .map(|id| encode_record(&mut encoder, id).unwrap())
        .collect();
    let list = encoder.vector_create_table(CT, OT, &records).unwrap();
    encoder.table_set_vector(0, 0, list).unwrap();
    let root = encoder.table_end().unwrap();
    let buffer = encoder.linearized().unwrap().to_vec();

    c.bench_function("decode_records_100", |b| {
        b.iter(|| {
            let table = TableView::new(black_box(&buffer), root.offset, 1, CT, OT).unwrap();
            let list = table.vector(0, 0, ElementKind::Table).unwrap().unwrap();

            let mut total = 0u64;
            for index in 0..list.len() {
                let record = list.table(index, 5).unwrap();
                total += record.get::<u64>(0).unwrap();
                total += record.string(3, 20).unwrap().map_or(0, str::len) as u64;
                let tags = record.vector(4, 24, ElementKind::String).unwrap().unwrap();
                total += tags.strings().filter_map(|tag| tag.ok()).count() as u64;
            }
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_flat_table,
    bench_nested_records,
    bench_scalar_vector,
    bench_cancel,
    bench_decode
);
criterion_main!(benches);
