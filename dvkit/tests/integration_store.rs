//! Integration tests for the store lifecycle.
//!
//! These tests exercise ingestion from packets and single appends, slicing,
//! erasing and retention across many shards, through the public API only.

use std::sync::Arc;
use std::time::Duration;

use dvkit::error::StoreError;
use dvkit::{DvkitError, Event, EventStore, Packet, Store, StoreConfig};

/// Events at `0, step, 2*step, ...` with coordinates derived from the index.
fn events(count: i64, step: i64) -> Vec<Event> {
    (0..count)
        .map(|i| Event::new(i * step, (i % 100) as i16, (i / 100) as i16, i % 2 == 0))
        .collect()
}

fn timestamps(store: &EventStore) -> Vec<i64> {
    store.timestamps()
}

#[test]
fn test_full_store_lifecycle() {
    let mut store = EventStore::with_config(&StoreConfig { shard_capacity: 64 }).unwrap();

    // Phase 1: ingest one packet, then single appends past the shard boundary.
    store
        .add_packet(Packet::from(events(100, 10)))
        .unwrap();
    for t in (1_000..2_000).step_by(10) {
        store.append(Event::new(t, 0, 0, true)).unwrap();
    }
    assert_eq!(store.len(), 200);
    assert_eq!(store.time_window().start_time, 0);
    assert_eq!(store.time_window().end_time, 1_990);
    assert!(store.shards().len() >= 3);

    // Phase 2: slices by count and time agree with each other.
    let by_count = store.slice(50, 100).unwrap();
    let (by_time, range) = store.slice_time_with_range(500, 1_500);
    assert_eq!(range, 50..150);
    assert_eq!(by_count, by_time);

    // Phase 3: erase a range that spans the packet shard and growable shards.
    let erased = store.erase_time(900, 1_100).unwrap();
    assert_eq!(erased, 20);
    assert_eq!(store.len(), 180);
    assert_eq!(store.index_at_time(900), 90);
    assert_eq!(store[90].timestamp, 1_100);

    // The earlier slice is untouched by the erase.
    assert_eq!(by_count.len(), 100);
    assert_eq!(by_count.front().unwrap().timestamp, 500);

    // Phase 4: retention drops whole shards older than the cutoff.
    store.retain_duration(Duration::from_micros(300));
    assert!(store.lowest_time() <= 1_690);
    assert!(store.lowest_time() > 0);
    assert_eq!(store.highest_time(), 1_990);
}

#[test]
fn test_shared_buffer_between_stores() {
    let buffer: Arc<[Event]> = Arc::from(events(10, 1));
    let a = Store::from_shared(Arc::clone(&buffer)).unwrap();
    let b = Store::from_shared(buffer).unwrap();

    let mut merged = a.slice(0, 5).unwrap();
    merged.add(&b.slice_from(5)).unwrap();
    assert_eq!(merged, a);
}

#[test]
fn test_merge_with_equal_boundary_timestamp() {
    let mut first = EventStore::new();
    first.append(Event::new(0, 0, 0, true)).unwrap();
    first.append(Event::new(10, 0, 0, true)).unwrap();

    let mut second = EventStore::new();
    second.append(Event::new(10, 1, 1, false)).unwrap();
    second.append(Event::new(20, 1, 1, false)).unwrap();

    first.add(&second).unwrap();
    assert_eq!(timestamps(&first), vec![0, 10, 10, 20]);

    let mut older = EventStore::new();
    older.append(Event::new(19, 0, 0, true)).unwrap();
    let err = first.add(&older).unwrap_err();
    assert!(matches!(
        err,
        DvkitError::Store(StoreError::OutOfOrder {
            highest: 20,
            incoming: 19
        })
    ));
    assert_eq!(first.len(), 4);
}

#[test]
fn test_down_sample_then_export_columns() {
    let store = Store::from_packet(Packet::from(events(10, 5))).unwrap();
    let sampled = store.down_sample(4).unwrap();
    assert_eq!(sampled.timestamps(), vec![0, 20, 40]);
    assert_eq!(sampled.xs(), vec![0, 4, 8]);
    assert_eq!(sampled.polarities(), vec![true, true, true]);
}

#[test]
fn test_cursor_matches_iterator() {
    let mut store = EventStore::with_shard_capacity(3);
    for e in events(10, 1) {
        store.append(e).unwrap();
    }

    let mut cursor = store.cursor_end();
    let mut backwards = Vec::new();
    for _ in 0..store.len() {
        cursor.move_prev();
        backwards.push(cursor.get().unwrap().timestamp);
    }
    let expected: Vec<i64> = store.iter().rev().map(|e| e.timestamp).collect();
    assert_eq!(backwards, expected);
}

#[test]
fn test_display_summary() {
    let store = Store::from_packet(Packet::from(events(3, 50))).unwrap();
    assert_eq!(
        store.to_string(),
        "Storage containing 3 elements within 100\u{3bc}s duration; time range within [0; 100]"
    );
    assert!((store.rate() - 30_000.0).abs() < 1e-6);
}
