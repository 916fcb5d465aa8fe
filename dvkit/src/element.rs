//! Element abstraction shared by every stream kind.
//!
//! The storage engine only needs one thing from a sample: an integer
//! microsecond timestamp. Everything else about an element is payload that the
//! engine carries without inspecting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A sample that carries a microsecond timestamp.
///
/// Within any [`Store`](crate::store::Store) elements appear in nondecreasing
/// timestamp order.
pub trait Timestamped {
    /// Timestamp of the sample in microseconds.
    fn timestamp(&self) -> i64;
}

/// A closed time window `[start_time, end_time]` in microseconds.
///
/// Stores report their extent this way (first and last timestamp). Time-based
/// slicing jobs report their nominal half-open window with the same type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window in microseconds.
    pub start_time: i64,
    /// End of the window in microseconds.
    pub end_time: i64,
}

impl TimeWindow {
    /// Creates a window from its two bounds.
    pub const fn new(start_time: i64, end_time: i64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Length of the window in microseconds.
    pub const fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}; {}]", self.start_time, self.end_time)
    }
}

/// A flat, ordered batch of elements exchanged with external readers and
/// writers.
///
/// A packet carries no invariant of its own and may be empty; ordering is
/// checked when a packet is ingested into a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet<T> {
    /// Elements in transfer order.
    pub elements: Vec<T>,
}

impl<T> Default for Packet<T> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T> Packet<T> {
    /// Creates an empty packet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements in the packet.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the packet holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: Timestamped> Packet<T> {
    /// Index of the first element older than its predecessor, if any.
    pub fn first_unsorted(&self) -> Option<usize> {
        self.elements
            .windows(2)
            .position(|pair| pair[1].timestamp() < pair[0].timestamp())
            .map(|i| i + 1)
    }

    /// Time window spanned by the first and last element, or zeros when empty.
    pub fn time_window(&self) -> TimeWindow {
        match (self.elements.first(), self.elements.last()) {
            (Some(first), Some(last)) => TimeWindow::new(first.timestamp(), last.timestamp()),
            _ => TimeWindow::default(),
        }
    }
}

impl<T> From<Vec<T>> for Packet<T> {
    fn from(elements: Vec<T>) -> Self {
        Self { elements }
    }
}

impl<T> FromIterator<T> for Packet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T: Timestamped> fmt::Display for Packet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.time_window();
        write!(
            f,
            "Packet containing {} elements within {}\u{3bc}s duration; time range within {}",
            self.len(),
            window.duration(),
            window
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bare timestamp used by unit tests across the crate.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Tick(pub i64);

    impl Timestamped for Tick {
        fn timestamp(&self) -> i64 {
            self.0
        }
    }

    pub(crate) fn ticks(ts: &[i64]) -> Vec<Tick> {
        ts.iter().copied().map(Tick).collect()
    }

    #[test]
    fn test_first_unsorted() {
        let sorted = Packet::from(ticks(&[1, 2, 2, 5]));
        assert_eq!(sorted.first_unsorted(), None);

        let unsorted = Packet::from(ticks(&[1, 4, 3, 5]));
        assert_eq!(unsorted.first_unsorted(), Some(2));
    }

    #[test]
    fn test_packet_display() {
        let packet = Packet::from(ticks(&[10, 20, 35]));
        assert_eq!(
            packet.to_string(),
            "Packet containing 3 elements within 25\u{3bc}s duration; time range within [10; 35]"
        );
        assert_eq!(Packet::<Tick>::new().time_window(), TimeWindow::default());
    }
}
