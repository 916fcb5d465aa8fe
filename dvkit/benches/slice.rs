//! Microbenchmarks for ingestion and slicing.
//!
//! Run with: `cargo bench -p dvkit -- slice`

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dvkit::simulation::generate_sample_events;
use dvkit::{CameraData, Event, EventStore, Resolution};

/// One million events, one per microsecond, in shards of 10k.
fn setup_store() -> EventStore {
    let source = generate_sample_events(Resolution::new(640, 480), 1_000_000, 0, 1, 42);
    let mut store = EventStore::new();
    for event in &source {
        store.append(*event).unwrap();
    }
    store
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("append/single_event", |b| {
        let mut store = EventStore::new();
        let mut ts = 0i64;
        b.iter(|| {
            ts += 1;
            store.append(black_box(Event::new(ts, 1, 2, true))).unwrap();
        });
    });
}

fn bench_slice(c: &mut Criterion) {
    let store = setup_store();
    let mut group = c.benchmark_group("slice");

    for length in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::new("by_count", length), &length, |b, &length| {
            b.iter(|| store.slice(black_box(123_456), length).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("by_time", length), &length, |b, &length| {
            let start = 123_456i64;
            let end = start + i64::try_from(length).unwrap();
            b.iter(|| store.slice_time(black_box(start), black_box(end)));
        });
    }
    group.finish();
}

fn bench_slice_by_number(c: &mut Criterion) {
    let mut data = CameraData::mono();
    data.insert("events", setup_store());

    c.bench_function("container/slice_by_number", |b| {
        b.iter(|| data.slice_by_number("events", black_box(500_000), 33_000).unwrap());
    });
}

criterion_group!(benches, bench_append, bench_slice, bench_slice_by_number);
criterion_main!(benches);
