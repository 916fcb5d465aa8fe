//! Bounded, capacity-tracked storage segments.
//!
//! A [`Shard`] is a window `[start, start + length)` over a backing buffer.
//! Stores are built out of shards, and slicing a store copies only these
//! window descriptors, never the elements behind them.
//!
//! # Design
//!
//! The backing buffer comes in two flavours:
//!
//! - **Growable**: an owned `Vec` reserved to the shard capacity. Appends are
//!   accepted only while the window reaches the end of the buffer and the
//!   buffer is below capacity.
//! - **Referencing**: an immutable, reference-counted slice handed in from
//!   outside (typically a [`Packet`](crate::element::Packet)). Its length is its
//!   capacity and it never accepts more data.
//!
//! Both are reference counted so that derived slices share them. A growable
//! buffer that is still shared with a derived slice is detached (its live
//! window copied into a fresh buffer) before the first write, which keeps
//! every previously handed out slice stable.

use std::sync::Arc;

use crate::element::{TimeWindow, Timestamped};
use crate::error::ShardError;

#[derive(Debug)]
enum Backing<T> {
    Growable(Arc<Vec<T>>),
    Referencing(Arc<[T]>),
}

impl<T> Clone for Backing<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Growable(buffer) => Self::Growable(Arc::clone(buffer)),
            Self::Referencing(buffer) => Self::Referencing(Arc::clone(buffer)),
        }
    }
}

impl<T> Backing<T> {
    fn as_slice(&self) -> &[T] {
        match self {
            Self::Growable(buffer) => buffer.as_slice(),
            Self::Referencing(buffer) => buffer,
        }
    }
}

/// A window over a growable or referencing backing buffer.
///
/// The shard caches the timestamps of its first and last logical element.
/// It does not check timestamp ordering on append; [`Store`](crate::store::Store)
/// does.
#[derive(Debug)]
pub struct Shard<T> {
    backing: Backing<T>,
    start: usize,
    length: usize,
    capacity: usize,
    lowest_time: i64,
    highest_time: i64,
}

impl<T> Clone for Shard<T> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            start: self.start,
            length: self.length,
            capacity: self.capacity,
            lowest_time: self.lowest_time,
            highest_time: self.highest_time,
        }
    }
}

impl<T> Shard<T> {
    /// Element at `offset` within the window.
    pub fn get(&self, offset: usize) -> Option<&T> {
        self.as_slice().get(offset)
    }

    /// The logical elements of the shard.
    pub fn as_slice(&self) -> &[T] {
        &self.backing.as_slice()[self.start..self.start + self.length]
    }

    /// Number of logical elements.
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Whether the window is empty.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Capacity of the backing buffer.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the shard owns a growable buffer.
    pub const fn is_growable(&self) -> bool {
        matches!(self.backing, Backing::Growable(_))
    }

    /// Timestamp of the first logical element, 0 when empty.
    pub const fn lowest_time(&self) -> i64 {
        self.lowest_time
    }

    /// Timestamp of the last logical element, 0 when empty.
    pub const fn highest_time(&self) -> i64 {
        self.highest_time
    }

    /// `[lowest_time, highest_time]` of the shard.
    pub const fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.lowest_time, self.highest_time)
    }
}

impl<T: Timestamped + Clone> Shard<T> {
    /// Creates an empty growable shard that will hold up to `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            backing: Backing::Growable(Arc::new(Vec::with_capacity(capacity))),
            start: 0,
            length: 0,
            capacity,
            lowest_time: 0,
            highest_time: 0,
        }
    }

    /// Creates a growable shard of `capacity` (at least 1) already holding
    /// `first`.
    pub fn starting_with(first: T, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut buffer = Vec::with_capacity(capacity);
        let timestamp = first.timestamp();
        buffer.push(first);
        Self {
            backing: Backing::Growable(Arc::new(buffer)),
            start: 0,
            length: 1,
            capacity,
            lowest_time: timestamp,
            highest_time: timestamp,
        }
    }

    /// Creates a referencing shard over a shared, immutable buffer.
    ///
    /// The window covers the whole buffer and the capacity equals its length.
    pub fn from_shared(buffer: Arc<[T]>) -> Self {
        let length = buffer.len();
        let mut shard = Self {
            backing: Backing::Referencing(buffer),
            start: 0,
            length,
            capacity: length,
            lowest_time: 0,
            highest_time: 0,
        };
        shard.refresh_bounds();
        shard
    }

    /// Creates a referencing shard that takes ownership of `elements`.
    pub fn from_vec(elements: Vec<T>) -> Self {
        Self::from_shared(Arc::from(elements))
    }

    /// Whether an element can be appended right now.
    ///
    /// True only for growable shards whose window reaches the end of the
    /// backing buffer while the buffer is still below capacity.
    pub fn can_accept_more(&self) -> bool {
        match &self.backing {
            Backing::Growable(buffer) => {
                self.start + self.length == buffer.len() && buffer.len() < self.capacity
            }
            Backing::Referencing(_) => false,
        }
    }

    /// Free slots left in the backing buffer, always 0 for referencing shards.
    pub fn remaining_capacity(&self) -> usize {
        match &self.backing {
            Backing::Growable(buffer) => self.capacity.saturating_sub(buffer.len()),
            Backing::Referencing(_) => 0,
        }
    }

    /// Appends one element to the end of the window.
    ///
    /// Returns the element back when [`can_accept_more`](Self::can_accept_more)
    /// is false.
    ///
    /// # Errors
    ///
    /// Returns `Err(element)` if the shard cannot take another element.
    pub fn append(&mut self, element: T) -> std::result::Result<(), T> {
        if !self.can_accept_more() {
            return Err(element);
        }
        let timestamp = element.timestamp();
        let Some(buffer) = self.writable() else {
            return Err(element);
        };
        buffer.push(element);
        if self.length == 0 {
            self.lowest_time = timestamp;
        }
        self.length += 1;
        self.highest_time = timestamp;
        Ok(())
    }

    /// Appends the logical elements of `other` to this shard.
    ///
    /// Succeeds only if this shard can accept more and has room for all of
    /// `other`. Merging an empty shard into a shard that can accept more is a
    /// successful no-op. On failure nothing is modified.
    #[must_use]
    pub fn merge(&mut self, other: &Shard<T>) -> bool {
        if !self.can_accept_more() || self.remaining_capacity() < other.length {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        let was_empty = self.length == 0;
        let Some(buffer) = self.writable() else {
            return false;
        };
        buffer.extend_from_slice(other.as_slice());
        if was_empty {
            self.lowest_time = other.lowest_time;
        }
        self.length += other.length;
        self.highest_time = other.highest_time;
        true
    }

    /// Drops `n` elements from the front of the window.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError::TrimOutOfRange`] if `n` exceeds the length.
    pub fn trim_front(&mut self, n: usize) -> Result<(), ShardError> {
        self.check_trim(n)?;
        self.start += n;
        self.length -= n;
        self.refresh_bounds();
        Ok(())
    }

    /// Drops `n` elements from the back of the window.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError::TrimOutOfRange`] if `n` exceeds the length.
    pub fn trim_back(&mut self, n: usize) -> Result<(), ShardError> {
        self.check_trim(n)?;
        self.length -= n;
        self.refresh_bounds();
        Ok(())
    }

    /// Trims the front up to the first element with timestamp `>= time`.
    ///
    /// Returns the number of elements removed.
    pub fn slice_from_time(&mut self, time: i64) -> usize {
        let removed = self.lower_bound(time);
        self.start += removed;
        self.length -= removed;
        self.refresh_bounds();
        removed
    }

    /// Trims the back so that only elements with timestamp `< time` remain.
    ///
    /// Returns the number of elements removed.
    pub fn slice_to_time(&mut self, time: i64) -> usize {
        let keep = self.lower_bound(time);
        let removed = self.length - keep;
        self.length = keep;
        self.refresh_bounds();
        removed
    }

    /// Offset of the first element whose timestamp is not less than `time`.
    pub fn lower_bound(&self, time: i64) -> usize {
        self.as_slice().partition_point(|e| e.timestamp() < time)
    }

    /// Sub-window `[from, to)` of this shard, clamped to its bounds.
    pub(crate) fn window(&self, from: usize, to: usize) -> Self {
        let to = to.min(self.length);
        let from = from.min(to);
        let mut shard = self.clone();
        shard.start += from;
        shard.length = to - from;
        shard.refresh_bounds();
        shard
    }

    fn check_trim(&self, n: usize) -> Result<(), ShardError> {
        if n > self.length {
            return Err(ShardError::TrimOutOfRange {
                requested: n,
                length: self.length,
            });
        }
        Ok(())
    }

    fn refresh_bounds(&mut self) {
        let (lowest, highest) = match self.as_slice() {
            [] => (0, 0),
            [first, .., last] => (first.timestamp(), last.timestamp()),
            [only] => (only.timestamp(), only.timestamp()),
        };
        self.lowest_time = lowest;
        self.highest_time = highest;
    }

    /// Exclusive access to the growable buffer, detaching it first when a
    /// derived slice still shares it.
    fn writable(&mut self) -> Option<&mut Vec<T>> {
        let Backing::Growable(buffer) = &mut self.backing else {
            return None;
        };
        if Arc::get_mut(buffer).is_none() {
            let mut detached = Vec::with_capacity(self.capacity.max(self.length));
            detached.extend_from_slice(&buffer[self.start..self.start + self.length]);
            *buffer = Arc::new(detached);
            self.start = 0;
        }
        Arc::get_mut(buffer)
    }
}
