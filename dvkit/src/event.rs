//! Point events from an event camera and the column views over event stores.

use serde::{Deserialize, Serialize};

use crate::element::Timestamped;
use crate::store::Store;

/// A single brightness-change event at one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Timestamp in microseconds.
    pub timestamp: i64,
    /// Pixel column.
    pub x: i16,
    /// Pixel row.
    pub y: i16,
    /// `true` for an increase in brightness.
    pub polarity: bool,
}

impl Event {
    /// Creates an event.
    pub const fn new(timestamp: i64, x: i16, y: i16, polarity: bool) -> Self {
        Self {
            timestamp,
            x,
            y,
            polarity,
        }
    }
}

impl Timestamped for Event {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Store of events.
pub type EventStore = Store<Event>;

/// Column-wise projections used by consumers that want flat numeric arrays.
impl Store<Event> {
    /// All timestamps in order.
    pub fn timestamps(&self) -> Vec<i64> {
        self.iter().map(|e| e.timestamp).collect()
    }

    /// All x coordinates in order.
    pub fn xs(&self) -> Vec<i16> {
        self.iter().map(|e| e.x).collect()
    }

    /// All y coordinates in order.
    pub fn ys(&self) -> Vec<i16> {
        self.iter().map(|e| e.y).collect()
    }

    /// All `[x, y]` pairs in order.
    pub fn coordinates(&self) -> Vec<[i16; 2]> {
        self.iter().map(|e| [e.x, e.y]).collect()
    }

    /// All polarities in order.
    pub fn polarities(&self) -> Vec<bool> {
        self.iter().map(|e| e.polarity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_views() {
        let mut store = EventStore::with_shard_capacity(2);
        store.append(Event::new(1, 10, 20, true)).unwrap();
        store.append(Event::new(2, 11, 21, false)).unwrap();
        store.append(Event::new(3, 12, 22, true)).unwrap();

        assert_eq!(store.timestamps(), vec![1, 2, 3]);
        assert_eq!(store.xs(), vec![10, 11, 12]);
        assert_eq!(store.ys(), vec![20, 21, 22]);
        assert_eq!(store.coordinates(), vec![[10, 20], [11, 21], [12, 22]]);
        assert_eq!(store.polarities(), vec![true, false, true]);
        assert_eq!(store.to_packet().len(), 3);
    }
}
