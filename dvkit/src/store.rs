//! The sharded, time-ordered element store.
//!
//! A [`Store`] is an ordered list of [`Shard`]s plus a parallel prefix-sum
//! index of element offsets. Its logical content is the concatenation of the
//! shard windows and is always nondecreasing in timestamp.
//!
//! # Design
//!
//! - Appends go to the last shard while it can accept more, otherwise a new
//!   growable shard of [`shard_capacity`](Store::shard_capacity) is opened.
//! - Slicing (by count or by time) copies shard descriptors and trims the two
//!   boundary shards; backing buffers are shared, never copied.
//! - Count lookups binary-search the offset index; time lookups binary-search
//!   the per-shard time bounds and then the elements of one shard. All time
//!   boundaries use lower-bound semantics, so `[t0, t1)` and `[t1, t2)` never
//!   overlap or leave a gap.
//!
//! # Example
//!
//! ```rust
//! use dvkit::{Event, EventStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = EventStore::new();
//! for t in [0, 10, 20, 30, 40] {
//!     store.append(Event::new(t, 1, 2, true))?;
//! }
//!
//! let middle = store.slice_time(10, 30);
//! assert_eq!(middle.len(), 2);
//! assert_eq!(middle.lowest_time(), 10);
//!
//! // Appending older data is rejected and leaves the store unchanged.
//! assert!(store.append(Event::new(5, 0, 0, false)).is_err());
//! assert_eq!(store.len(), 5);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::{Index, Range};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DEFAULT_SHARD_CAPACITY, StoreConfig};
use crate::element::{Packet, TimeWindow, Timestamped};
use crate::error::{Result, StoreError};
use crate::iter::{Cursor, Iter};
use crate::shard::Shard;

/// Ordered sequence of shards forming one logical, time-ordered stream.
///
/// Cloning a store is shallow: the copy shares backing buffers but is
/// structurally independent, so mutating one never changes the other.
#[derive(Debug)]
pub struct Store<T> {
    shards: Vec<Shard<T>>,
    /// `offsets[i]` is the number of elements held by `shards[..i]`.
    offsets: Vec<usize>,
    total_len: usize,
    shard_capacity: usize,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
            offsets: self.offsets.clone(),
            total_len: self.total_len,
            shard_capacity: self.shard_capacity,
        }
    }
}

impl<T: Timestamped + Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Timestamped + Clone> Store<T> {
    /// Creates an empty store with the default shard capacity.
    pub fn new() -> Self {
        Self::with_shard_capacity(DEFAULT_SHARD_CAPACITY)
    }

    /// Creates an empty store whose new shards hold `capacity` elements.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_shard_capacity(capacity: usize) -> Self {
        Self {
            shards: Vec::new(),
            offsets: Vec::new(),
            total_len: 0,
            shard_capacity: capacity.max(1),
        }
    }

    /// Creates an empty store from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the configuration is invalid.
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_shard_capacity(config.shard_capacity))
    }

    /// Creates a store holding one referencing shard over the packet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsortedPacket`] if the packet is not
    /// nondecreasing in time.
    pub fn from_packet(packet: Packet<T>) -> Result<Self> {
        let mut store = Self::new();
        store.add_packet(packet)?;
        Ok(store)
    }

    /// Creates a store holding one referencing shard over a shared buffer.
    ///
    /// The buffer may be shared with other stores; it is never written to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsortedPacket`] if the buffer is not
    /// nondecreasing in time.
    pub fn from_shared(buffer: Arc<[T]>) -> Result<Self> {
        check_sorted(&buffer)?;
        let mut store = Self::new();
        store.push_shard(Shard::from_shared(buffer));
        Ok(store)
    }

    /// Builds a store directly from shard descriptors, skipping empty ones.
    pub(crate) fn from_shards(shards: Vec<Shard<T>>, shard_capacity: usize) -> Self {
        let mut store = Self::with_shard_capacity(shard_capacity);
        for shard in shards {
            store.push_shard(shard);
        }
        store
    }

    /// Ingests a packet as a new referencing shard.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsortedPacket`] if the packet is not internally
    /// sorted, or [`StoreError::OutOfOrder`] if it starts before the current
    /// highest time.
    pub fn add_packet(&mut self, packet: Packet<T>) -> Result<()> {
        if packet.is_empty() {
            return Ok(());
        }
        check_sorted(&packet.elements)?;
        self.check_not_older(packet.time_window().start_time)?;
        self.push_shard(Shard::from_vec(packet.elements));
        Ok(())
    }

    /// Appends one element.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfOrder`] if the element is older than the
    /// current highest time. The store is left unchanged.
    pub fn append(&mut self, element: T) -> Result<()> {
        self.check_not_older(element.timestamp())?;

        let element = match self.shards.last_mut() {
            Some(last) => match last.append(element) {
                Ok(()) => {
                    self.total_len += 1;
                    return Ok(());
                }
                Err(element) => element,
            },
            None => element,
        };

        tracing::trace!(
            shards = self.shards.len() + 1,
            capacity = self.shard_capacity,
            "opening growable shard"
        );
        self.push_shard(Shard::starting_with(element, self.shard_capacity));
        Ok(())
    }

    /// Merges another store into this one.
    ///
    /// Each shard of `other` is merged into the last shard when it fits,
    /// otherwise appended as a new shard. The boundary is inclusive: `other`
    /// may start exactly at this store's highest time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfOrder`] if `other` starts before this
    /// store's highest time. Nothing is modified in that case.
    pub fn add(&mut self, other: &Store<T>) -> Result<()> {
        self.check_can_add(other)?;
        for shard in &other.shards {
            let merged = self
                .shards
                .last_mut()
                .is_some_and(|last| last.merge(shard));
            if merged {
                self.total_len += shard.len();
            } else {
                self.push_shard(shard.clone());
            }
        }
        Ok(())
    }

    /// Checks that [`add`](Self::add) would accept `other`, without mutating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfOrder`] on an ordering violation.
    pub fn check_can_add(&self, other: &Store<T>) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        self.check_not_older(other.lowest_time())
    }

    /// Elements `[start, start + length)` as a new store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RangeOutOfBounds`] if the range overflows or
    /// reaches past the end.
    pub fn slice(&self, start: usize, length: usize) -> Result<Self> {
        let end = self.checked_end(start, length)?;
        Ok(self.range(start, end))
    }

    /// Elements from `start` to the end, empty if `start >= len()`.
    #[must_use]
    pub fn slice_from(&self, start: usize) -> Self {
        self.range(start.min(self.total_len), self.total_len)
    }

    /// The last `length` elements, or the whole store if it is shorter.
    #[must_use]
    pub fn slice_back(&self, length: usize) -> Self {
        self.range(self.total_len.saturating_sub(length), self.total_len)
    }

    /// Elements with timestamps in `[start_time, end_time)`.
    ///
    /// An inverted range yields an empty store.
    #[must_use]
    pub fn slice_time(&self, start_time: i64, end_time: i64) -> Self {
        self.slice_time_with_range(start_time, end_time).0
    }

    /// Like [`slice_time`](Self::slice_time), also returning the global index
    /// range `[start, end)` the slice covers.
    #[must_use]
    pub fn slice_time_with_range(&self, start_time: i64, end_time: i64) -> (Self, Range<usize>) {
        let start = self.index_at_time(start_time);
        let end = self.index_at_time(end_time).max(start);
        (self.range(start, end), start..end)
    }

    /// Elements from `start_time` through the last element.
    ///
    /// A negative `start_time` is relative to the highest time, so
    /// `slice_time_from(-1000)` keeps the last millisecond of data.
    #[must_use]
    pub fn slice_time_from(&self, start_time: i64) -> Self {
        if self.is_empty() {
            return self.empty_like();
        }
        let highest = self.highest_time();
        let start = if start_time < 0 {
            highest.saturating_add(start_time)
        } else {
            start_time
        };
        self.slice_time(start, highest.saturating_add(1))
    }

    /// Elements with timestamps `>= time`, with no upper bound.
    #[must_use]
    pub fn slice_since(&self, time: i64) -> Self {
        self.range(self.index_at_time(time), self.total_len)
    }

    /// Keeps every `factor`-th element, starting with the first.
    ///
    /// The result is a single-shard store of `ceil(len / factor)` elements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDownSampleFactor`] if `factor` is 0.
    pub fn down_sample(&self, factor: usize) -> Result<Self> {
        if factor == 0 {
            return Err(StoreError::InvalidDownSampleFactor.into());
        }
        let sampled: Vec<T> = self.iter().step_by(factor).cloned().collect();
        Ok(Self::from_shards(
            vec![Shard::from_vec(sampled)],
            self.shard_capacity,
        ))
    }

    /// Removes elements `[start, start + length)` in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RangeOutOfBounds`] if the range reaches past the
    /// end. The store is left unchanged in that case.
    pub fn erase(&mut self, start: usize, length: usize) -> Result<()> {
        let end = self.checked_end(start, length)?;
        if length == 0 {
            return Ok(());
        }

        let first = self.shard_of(start);
        let last = self.shard_of(end - 1);
        let local_start = start - self.offsets[first];
        let local_end = end - self.offsets[last];

        if first == last {
            let shard_len = self.shards[first].len();
            if local_start == 0 && local_end == shard_len {
                self.shards.remove(first);
            } else if local_start == 0 {
                self.shards[first].trim_front(length)?;
            } else if local_end == shard_len {
                self.shards[first].trim_back(length)?;
            } else {
                let mut tail = self.shards[first].clone();
                self.shards[first].trim_back(shard_len - local_start)?;
                tail.trim_front(local_end)?;
                tracing::debug!(shard = first, start, length, "erase split shard");
                self.shards.insert(first + 1, tail);
            }
        } else {
            let last_len = self.shards[last].len();
            let remove_last = local_end == last_len;
            if !remove_last {
                self.shards[last].trim_front(local_end)?;
            }

            let first_len = self.shards[first].len();
            let remove_first = local_start == 0;
            if !remove_first {
                self.shards[first].trim_back(first_len - local_start)?;
            }

            let drain_from = if remove_first { first } else { first + 1 };
            let drain_to = if remove_last { last + 1 } else { last };
            self.shards.drain(drain_from..drain_to);
        }

        self.rebuild_offsets(first);
        Ok(())
    }

    /// Removes elements with timestamps in `[start_time, end_time)`.
    ///
    /// Returns the number of elements removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTimeRange`] if `start_time > end_time`.
    pub fn erase_time(&mut self, start_time: i64, end_time: i64) -> Result<usize> {
        if start_time > end_time {
            return Err(StoreError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            }
            .into());
        }
        let start = self.index_at_time(start_time);
        let end = self.index_at_time(end_time);
        self.erase(start, end - start)?;
        Ok(end - start)
    }

    /// Drops every shard that lies entirely before `highest_time - duration`.
    ///
    /// The shard straddling the cutoff is kept whole, so the store may still
    /// hold a few elements older than the cutoff.
    pub fn retain_duration(&mut self, duration: Duration) {
        if self.is_empty() {
            return;
        }
        let span = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        let cutoff = self.highest_time().saturating_sub(span);
        let drop_count = self.shards.partition_point(|s| s.highest_time() < cutoff);
        if drop_count == 0 {
            return;
        }
        tracing::debug!(dropped = drop_count, cutoff, "retention dropped shards");
        self.shards.drain(..drop_count);
        self.rebuild_offsets(0);
    }

    /// Global index of the first element with timestamp `>= time`.
    ///
    /// Equals [`len`](Self::len) when every element is older than `time`.
    pub fn index_at_time(&self, time: i64) -> usize {
        let shard = self.shards.partition_point(|s| s.highest_time() < time);
        match self.shards.get(shard) {
            Some(s) => self.offsets[shard] + s.lower_bound(time),
            None => self.total_len,
        }
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.total_len
    }

    /// Whether the store holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    /// Timestamp of the first element, 0 when empty.
    pub fn lowest_time(&self) -> i64 {
        self.shards.first().map_or(0, Shard::lowest_time)
    }

    /// Timestamp of the last element, 0 when empty.
    pub fn highest_time(&self) -> i64 {
        self.shards.last().map_or(0, Shard::highest_time)
    }

    /// `[lowest_time, highest_time]` of the store.
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.lowest_time(), self.highest_time())
    }

    /// Time spanned between the first and last element.
    pub fn duration(&self) -> Duration {
        Duration::from_micros(u64::try_from(self.time_window().duration()).unwrap_or(0))
    }

    /// Average element rate in Hz, 0 when the store spans no time.
    #[allow(clippy::cast_precision_loss)] // rates are approximate by nature
    pub fn rate(&self) -> f64 {
        let seconds = self.duration().as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.total_len as f64 / seconds
    }

    /// Whether `time` lies within `[lowest_time, highest_time]`.
    pub fn is_within_time_range(&self, time: i64) -> bool {
        !self.is_empty() && self.lowest_time() <= time && time <= self.highest_time()
    }

    /// Element at a global index.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.total_len {
            return None;
        }
        let shard = self.shard_of(index);
        self.shards[shard].get(index - self.offsets[shard])
    }

    /// Element at a global index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfBounds`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T> {
        self.get(index).ok_or_else(|| {
            StoreError::IndexOutOfBounds {
                index,
                size: self.total_len,
            }
            .into()
        })
    }

    /// First element.
    pub fn front(&self) -> Option<&T> {
        self.shards.first().and_then(|s| s.get(0))
    }

    /// Last element.
    pub fn back(&self) -> Option<&T> {
        self.shards
            .last()
            .and_then(|s| s.get(s.len().saturating_sub(1)))
    }

    /// Iterator over all elements in time order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.shards, self.total_len)
    }

    /// Cursor positioned on the first element.
    pub fn cursor_begin(&self) -> Cursor<'_, T> {
        Cursor::begin(&self.shards)
    }

    /// Cursor positioned on the end sentinel.
    pub fn cursor_end(&self) -> Cursor<'_, T> {
        Cursor::end(&self.shards)
    }

    /// Copies all elements into a packet.
    pub fn to_packet(&self) -> Packet<T> {
        self.iter().cloned().collect()
    }

    /// The shard descriptors backing this store.
    pub fn shards(&self) -> &[Shard<T>] {
        &self.shards
    }

    /// Capacity given to newly opened growable shards.
    pub const fn shard_capacity(&self) -> usize {
        self.shard_capacity
    }

    /// Sets the capacity for shards opened from now on, at least 1.
    pub fn set_shard_capacity(&mut self, capacity: usize) {
        self.shard_capacity = capacity.max(1);
    }

    /// An empty store with the same shard capacity.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self::with_shard_capacity(self.shard_capacity)
    }

    fn check_not_older(&self, incoming: i64) -> Result<()> {
        let highest = self.highest_time();
        if !self.is_empty() && incoming < highest {
            return Err(StoreError::OutOfOrder { highest, incoming }.into());
        }
        Ok(())
    }

    fn checked_end(&self, start: usize, length: usize) -> Result<usize> {
        match start.checked_add(length) {
            Some(end) if end <= self.total_len => Ok(end),
            _ => Err(StoreError::RangeOutOfBounds {
                start,
                length,
                size: self.total_len,
            }
            .into()),
        }
    }

    /// Index of the shard holding global element `index < len()`.
    fn shard_of(&self, index: usize) -> usize {
        self.offsets.partition_point(|&o| o <= index).saturating_sub(1)
    }

    /// Elements `[start, end)`, with `start <= end <= len()`.
    fn range(&self, start: usize, end: usize) -> Self {
        if start >= end {
            return self.empty_like();
        }
        let first = self.shard_of(start);
        let last = self.shard_of(end - 1);
        let shards = self.shards[first..=last]
            .iter()
            .enumerate()
            .map(|(i, shard)| {
                let offset = self.offsets[first + i];
                let from = start.saturating_sub(offset);
                let to = (end - offset).min(shard.len());
                shard.window(from, to)
            })
            .collect();
        Self::from_shards(shards, self.shard_capacity)
    }

    fn push_shard(&mut self, shard: Shard<T>) {
        if shard.is_empty() {
            return;
        }
        self.offsets.push(self.total_len);
        self.total_len += shard.len();
        self.shards.push(shard);
    }

    /// Drops empty shards and recomputes offsets from shard `from` onward.
    fn rebuild_offsets(&mut self, from: usize) {
        let from = from.min(self.shards.len());
        let mut running = if from == 0 {
            0
        } else {
            self.offsets[from - 1] + self.shards[from - 1].len()
        };
        let mut index = from;
        while index < self.shards.len() {
            if self.shards[index].is_empty() {
                self.shards.remove(index);
                continue;
            }
            index += 1;
        }
        self.offsets.truncate(from);
        for shard in &self.shards[from..] {
            self.offsets.push(running);
            running += shard.len();
        }
        self.total_len = running;
    }
}

fn check_sorted<T: Timestamped>(elements: &[T]) -> Result<()> {
    match elements
        .windows(2)
        .position(|pair| pair[1].timestamp() < pair[0].timestamp())
    {
        Some(index) => Err(StoreError::UnsortedPacket { index: index + 1 }.into()),
        None => Ok(()),
    }
}

impl<T: Timestamped + Clone> Index<usize> for Store<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index {index} out of bounds for store of size {}",
                self.total_len
            ),
        }
    }
}

impl<T: Timestamped + Clone + PartialEq> PartialEq for Store<T> {
    /// Stores are equal when they hold equal elements in the same order,
    /// regardless of how those elements are split into shards.
    fn eq(&self, other: &Self) -> bool {
        self.total_len == other.total_len && self.iter().eq(other.iter())
    }
}

impl<'a, T: Timestamped + Clone> IntoIterator for &'a Store<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Timestamped + Clone> fmt::Display for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.time_window();
        write!(
            f,
            "Storage containing {} elements within {}\u{3bc}s duration; time range within {}",
            self.total_len,
            window.duration(),
            window
        )
    }
}
