//! Synthetic data for demos, benchmarks and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::container::Resolution;
use crate::event::{Event, EventStore};

/// Generates `count` uniformly scattered events.
///
/// Timestamps start at `start_time` and advance by `step` microseconds per
/// event. The same `seed` always yields the same store.
#[must_use]
pub fn generate_sample_events(
    resolution: Resolution,
    count: usize,
    start_time: i64,
    step: i64,
    seed: u64,
) -> EventStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let width = resolution.width.max(1);
    let height = resolution.height.max(1);

    let mut store = EventStore::with_shard_capacity(count.max(1));
    let mut timestamp = start_time;
    for _ in 0..count {
        let event = Event::new(
            timestamp,
            clamp_coordinate(rng.gen_range(0..width)),
            clamp_coordinate(rng.gen_range(0..height)),
            rng.gen_bool(0.5),
        );
        if store.append(event).is_err() {
            break;
        }
        timestamp = timestamp.saturating_add(step.max(0));
    }
    store
}

fn clamp_coordinate(value: u16) -> i16 {
    i16::try_from(value).unwrap_or(i16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let resolution = Resolution::new(64, 48);
        let a = generate_sample_events(resolution, 500, 1_000, 10, 7);
        let b = generate_sample_events(resolution, 500, 1_000, 10, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
        assert_eq!(a.time_window().start_time, 1_000);
        assert_eq!(a.time_window().end_time, 1_000 + 499 * 10);
        assert!(a.iter().all(|e| (0..64).contains(&e.x) && (0..48).contains(&e.y)));
    }

    #[test]
    fn test_zero_events() {
        let store = generate_sample_events(Resolution::new(10, 10), 0, 0, 1, 0);
        assert!(store.is_empty());
    }
}
