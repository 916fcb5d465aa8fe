//! Name-keyed collections of streams with time-aligned slicing.
//!
//! [`CameraData`] maps stream names to a [`StreamStore`], a tagged union over
//! the four element kinds. The standard mono camera layout pre-populates
//! `events`, `frames`, `imus` and `triggers`; a customized container starts
//! empty and accepts any names.
//!
//! The container enforces no cross-stream temporal invariant. Alignment
//! happens only in the slicing operations:
//!
//! - [`slice_by_number`](CameraData::slice_by_number) cuts the named stream by
//!   count and every other stream by the resulting time window, so streams of
//!   very different rates stay synchronized.
//! - [`slice_by_time`](CameraData::slice_by_time) cuts every stream by the same
//!   explicit time range.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{TimeWindow, Timestamped};
use crate::error::{ContainerError, Result};
use crate::event::{Event, EventStore};
use crate::frame::{Frame, FrameStore};
use crate::imu::{Imu, ImuStore};
use crate::store::Store;
use crate::trigger::{Trigger, TriggerStore};

/// Name of the standard event stream.
pub const EVENTS: &str = "events";
/// Name of the standard frame stream.
pub const FRAMES: &str = "frames";
/// Name of the standard IMU stream.
pub const IMUS: &str = "imus";
/// Name of the standard trigger stream.
pub const TRIGGERS: &str = "triggers";

/// The element kind held by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Point events.
    Events,
    /// Images.
    Frames,
    /// Inertial samples.
    Imus,
    /// Trigger marks.
    Triggers,
}

impl StreamKind {
    /// Lowercase name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Frames => "frames",
            Self::Imus => "imus",
            Self::Triggers => "triggers",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor geometry carried alongside a stream. The library never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Resolution {
    /// Creates a resolution.
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// One stream of a container: a store of one of the four element kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStore {
    /// Event stream.
    Events(EventStore),
    /// Frame stream.
    Frames(FrameStore),
    /// IMU stream.
    Imus(ImuStore),
    /// Trigger stream.
    Triggers(TriggerStore),
}

/// Evaluates `$body` with `$store` bound to the inner store, whatever its kind.
macro_rules! with_store {
    ($value:expr, $store:ident => $body:expr) => {
        match $value {
            StreamStore::Events($store) => $body,
            StreamStore::Frames($store) => $body,
            StreamStore::Imus($store) => $body,
            StreamStore::Triggers($store) => $body,
        }
    };
}

/// Like `with_store!`, but wraps the result back into the same variant.
macro_rules! map_store {
    ($value:expr, $store:ident => $body:expr) => {
        match $value {
            StreamStore::Events($store) => StreamStore::Events($body),
            StreamStore::Frames($store) => StreamStore::Frames($body),
            StreamStore::Imus($store) => StreamStore::Imus($body),
            StreamStore::Triggers($store) => StreamStore::Triggers($body),
        }
    };
}

impl StreamStore {
    /// An empty store of the given kind.
    pub fn empty(kind: StreamKind) -> Self {
        match kind {
            StreamKind::Events => Self::Events(Store::new()),
            StreamKind::Frames => Self::Frames(Store::new()),
            StreamKind::Imus => Self::Imus(Store::new()),
            StreamKind::Triggers => Self::Triggers(Store::new()),
        }
    }

    /// Kind of elements held.
    pub const fn kind(&self) -> StreamKind {
        match self {
            Self::Events(_) => StreamKind::Events,
            Self::Frames(_) => StreamKind::Frames,
            Self::Imus(_) => StreamKind::Imus,
            Self::Triggers(_) => StreamKind::Triggers,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        with_store!(self, s => s.len())
    }

    /// Whether the stream is empty.
    pub fn is_empty(&self) -> bool {
        with_store!(self, s => s.is_empty())
    }

    /// Time window of the stream.
    pub fn time_window(&self) -> TimeWindow {
        with_store!(self, s => s.time_window())
    }

    /// Count-based slice, see [`Store::slice`].
    ///
    /// # Errors
    ///
    /// Returns
    /// [`StoreError::RangeOutOfBounds`](crate::error::StoreError::RangeOutOfBounds)
    /// for a range past the end.
    pub fn slice(&self, start: usize, length: usize) -> Result<Self> {
        Ok(map_store!(self, s => s.slice(start, length)?))
    }

    /// Elements from `start` on, see [`Store::slice_from`].
    #[must_use]
    pub fn slice_from(&self, start: usize) -> Self {
        map_store!(self, s => s.slice_from(start))
    }

    /// Time-based slice `[start_time, end_time)`, see [`Store::slice_time`].
    #[must_use]
    pub fn slice_time(&self, start_time: i64, end_time: i64) -> Self {
        map_store!(self, s => s.slice_time(start_time, end_time))
    }

    /// Elements at or after `time`, see [`Store::slice_since`].
    #[must_use]
    pub fn slice_since(&self, time: i64) -> Self {
        map_store!(self, s => s.slice_since(time))
    }

    /// An empty stream of the same kind and shard capacity.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        map_store!(self, s => s.empty_like())
    }

    /// Checks that [`add`](Self::add) would succeed, without mutating.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::KindMismatch`] for different kinds, or
    /// [`StoreError::OutOfOrder`](crate::error::StoreError::OutOfOrder) for an
    /// ordering violation.
    pub fn check_can_add(&self, name: &str, other: &StreamStore) -> Result<()> {
        match (self, other) {
            (Self::Events(a), Self::Events(b)) => a.check_can_add(b),
            (Self::Frames(a), Self::Frames(b)) => a.check_can_add(b),
            (Self::Imus(a), Self::Imus(b)) => a.check_can_add(b),
            (Self::Triggers(a), Self::Triggers(b)) => a.check_can_add(b),
            _ => Err(kind_mismatch(name, self.kind(), other.kind())),
        }
    }

    /// Merges a stream of the same kind into this one.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::KindMismatch`] for different kinds, or
    /// [`StoreError::OutOfOrder`](crate::error::StoreError::OutOfOrder) for an
    /// ordering violation.
    pub fn add(&mut self, name: &str, other: &StreamStore) -> Result<()> {
        let existing = self.kind();
        match (self, other) {
            (Self::Events(a), Self::Events(b)) => a.add(b),
            (Self::Frames(a), Self::Frames(b)) => a.add(b),
            (Self::Imus(a), Self::Imus(b)) => a.add(b),
            (Self::Triggers(a), Self::Triggers(b)) => a.add(b),
            _ => Err(kind_mismatch(name, existing, other.kind())),
        }
    }
}

/// Element types that can live in a [`StreamStore`].
pub trait StreamElement: Timestamped + Clone + Sized {
    /// The stream kind for this element type.
    const KIND: StreamKind;

    /// Borrows the typed store if `stream` holds this element type.
    fn view(stream: &StreamStore) -> Option<&Store<Self>>;

    /// Mutably borrows the typed store if `stream` holds this element type.
    fn view_mut(stream: &mut StreamStore) -> Option<&mut Store<Self>>;

    /// Wraps a typed store into the union.
    fn wrap(store: Store<Self>) -> StreamStore;
}

macro_rules! impl_stream_element {
    ($element:ty, $variant:ident) => {
        impl StreamElement for $element {
            const KIND: StreamKind = StreamKind::$variant;

            fn view(stream: &StreamStore) -> Option<&Store<Self>> {
                match stream {
                    StreamStore::$variant(store) => Some(store),
                    _ => None,
                }
            }

            fn view_mut(stream: &mut StreamStore) -> Option<&mut Store<Self>> {
                match stream {
                    StreamStore::$variant(store) => Some(store),
                    _ => None,
                }
            }

            fn wrap(store: Store<Self>) -> StreamStore {
                StreamStore::$variant(store)
            }
        }

        impl From<Store<$element>> for StreamStore {
            fn from(store: Store<$element>) -> Self {
                StreamStore::$variant(store)
            }
        }
    };
}

impl_stream_element!(Event, Events);
impl_stream_element!(Frame, Frames);
impl_stream_element!(Imu, Imus);
impl_stream_element!(Trigger, Triggers);

/// A recording session's set of streams, keyed by name.
///
/// # Example
///
/// ```rust
/// use dvkit::{CameraData, Event, Frame, PixelFormat};
/// use bytes::Bytes;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut data = CameraData::mono();
/// for t in 0..100 {
///     data.events_mut()?.append(Event::new(t, 0, 0, true))?;
/// }
/// for t in [0, 20, 49, 60, 999] {
///     let pixels = Bytes::from_static(&[0]);
///     data.frames_mut()?.append(Frame::new(t, 1, 1, PixelFormat::Gray, pixels))?;
/// }
///
/// let first_half = data.slice_by_number("events", 0, 50)?;
/// assert_eq!(first_half.events()?.len(), 50);
/// assert_eq!(first_half.frames()?.len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraData {
    streams: BTreeMap<String, StreamStore>,
    resolutions: BTreeMap<String, Resolution>,
}

impl CameraData {
    /// Standard layout with empty `events`, `frames`, `imus` and `triggers`.
    pub fn mono() -> Self {
        let mut data = Self::customized();
        data.insert(EVENTS, StreamStore::empty(StreamKind::Events));
        data.insert(FRAMES, StreamStore::empty(StreamKind::Frames));
        data.insert(IMUS, StreamStore::empty(StreamKind::Imus));
        data.insert(TRIGGERS, StreamStore::empty(StreamKind::Triggers));
        data
    }

    /// A container with no streams; any name may be inserted.
    pub fn customized() -> Self {
        Self::default()
    }

    /// Inserts or replaces a stream, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        stream: impl Into<StreamStore>,
    ) -> Option<StreamStore> {
        self.streams.insert(name.into(), stream.into())
    }

    /// Removes a stream.
    pub fn remove(&mut self, name: &str) -> Option<StreamStore> {
        self.resolutions.remove(name);
        self.streams.remove(name)
    }

    /// Borrows a stream by name.
    pub fn get(&self, name: &str) -> Option<&StreamStore> {
        self.streams.get(name)
    }

    /// Whether a stream with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Stream names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Iterates over `(name, stream)` pairs in name order.
    pub fn streams(&self) -> impl Iterator<Item = (&str, &StreamStore)> {
        self.streams.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Number of streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Whether every stream is empty.
    pub fn is_empty(&self) -> bool {
        self.streams.values().all(StreamStore::is_empty)
    }

    /// Typed access to a stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if absent, or
    /// [`ContainerError::KindMismatch`] if it holds another element kind.
    pub fn stream<T: StreamElement>(&self, name: &str) -> Result<&Store<T>> {
        let stream = self.require(name)?;
        T::view(stream).ok_or_else(|| kind_mismatch(name, stream.kind(), T::KIND))
    }

    /// Typed mutable access to a stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if absent, or
    /// [`ContainerError::KindMismatch`] if it holds another element kind.
    pub fn stream_mut<T: StreamElement>(&mut self, name: &str) -> Result<&mut Store<T>> {
        let stream = self
            .streams
            .get_mut(name)
            .ok_or_else(|| unknown_stream(name))?;
        let kind = stream.kind();
        T::view_mut(stream).ok_or_else(|| kind_mismatch(name, kind, T::KIND))
    }

    /// The `events` stream.
    ///
    /// # Errors
    ///
    /// Fails if there is no `events` stream of events.
    pub fn events(&self) -> Result<&EventStore> {
        self.stream(EVENTS)
    }

    /// The `events` stream, mutably.
    ///
    /// # Errors
    ///
    /// Fails if there is no `events` stream of events.
    pub fn events_mut(&mut self) -> Result<&mut EventStore> {
        self.stream_mut(EVENTS)
    }

    /// The `frames` stream.
    ///
    /// # Errors
    ///
    /// Fails if there is no `frames` stream of frames.
    pub fn frames(&self) -> Result<&FrameStore> {
        self.stream(FRAMES)
    }

    /// The `frames` stream, mutably.
    ///
    /// # Errors
    ///
    /// Fails if there is no `frames` stream of frames.
    pub fn frames_mut(&mut self) -> Result<&mut FrameStore> {
        self.stream_mut(FRAMES)
    }

    /// The `imus` stream.
    ///
    /// # Errors
    ///
    /// Fails if there is no `imus` stream of IMU samples.
    pub fn imus(&self) -> Result<&ImuStore> {
        self.stream(IMUS)
    }

    /// The `imus` stream, mutably.
    ///
    /// # Errors
    ///
    /// Fails if there is no `imus` stream of IMU samples.
    pub fn imus_mut(&mut self) -> Result<&mut ImuStore> {
        self.stream_mut(IMUS)
    }

    /// The `triggers` stream.
    ///
    /// # Errors
    ///
    /// Fails if there is no `triggers` stream of triggers.
    pub fn triggers(&self) -> Result<&TriggerStore> {
        self.stream(TRIGGERS)
    }

    /// The `triggers` stream, mutably.
    ///
    /// # Errors
    ///
    /// Fails if there is no `triggers` stream of triggers.
    pub fn triggers_mut(&mut self) -> Result<&mut TriggerStore> {
        self.stream_mut(TRIGGERS)
    }

    /// Attaches sensor geometry to a stream name.
    pub fn set_resolution(&mut self, name: impl Into<String>, resolution: Resolution) {
        self.resolutions.insert(name.into(), resolution);
    }

    /// Sensor geometry attached to a stream name, if any.
    pub fn resolution(&self, name: &str) -> Option<Resolution> {
        self.resolutions.get(name).copied()
    }

    /// Number of elements in the named stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if absent.
    pub fn size(&self, name: &str) -> Result<usize> {
        Ok(self.require(name)?.len())
    }

    /// Time window of the named stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if absent.
    pub fn time_window(&self, name: &str) -> Result<TimeWindow> {
        Ok(self.require(name)?.time_window())
    }

    /// Merges a stream into the same-named entry, inserting it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::KindMismatch`] or
    /// [`StoreError::OutOfOrder`](crate::error::StoreError::OutOfOrder); the
    /// container is unchanged on error.
    pub fn add_stream(&mut self, name: &str, stream: &StreamStore) -> Result<()> {
        match self.streams.get_mut(name) {
            Some(existing) => existing.add(name, stream),
            None => {
                self.streams.insert(name.to_string(), stream.clone());
                Ok(())
            }
        }
    }

    /// Merges every stream of `other` into the same-named stream here.
    ///
    /// Streams missing from this container are inserted. All streams are
    /// validated before any is modified, so a failure leaves this container
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::KindMismatch`] or
    /// [`StoreError::OutOfOrder`](crate::error::StoreError::OutOfOrder) for the
    /// first offending stream.
    pub fn add(&mut self, other: &CameraData) -> Result<()> {
        for (name, stream) in &other.streams {
            if let Some(existing) = self.streams.get(name) {
                existing.check_can_add(name, stream)?;
            }
        }
        for (name, stream) in &other.streams {
            self.add_stream(name, stream)?;
        }
        for (name, resolution) in &other.resolutions {
            self.resolutions.entry(name.clone()).or_insert(*resolution);
        }
        Ok(())
    }

    /// Slices the named stream by count and every other stream by the time
    /// window of that slice.
    ///
    /// Other streams keep the elements whose timestamps fall within the
    /// inclusive window `[first, last]` of the named slice.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if `name` is absent, or
    /// [`StoreError::RangeOutOfBounds`](crate::error::StoreError::RangeOutOfBounds)
    /// if the range reaches past its end.
    pub fn slice_by_number(&self, name: &str, start: usize, length: usize) -> Result<CameraData> {
        let target = self.require(name)?.slice(start, length)?;
        if target.is_empty() {
            return Ok(self.empty_like());
        }
        let window = target.time_window();
        let end = window.end_time.saturating_add(1);
        Ok(self.map_streams(|stream_name, stream| {
            if stream_name == name {
                target.clone()
            } else {
                stream.slice_time(window.start_time, end)
            }
        }))
    }

    /// [`slice_by_number`](Self::slice_by_number) from `start` to the end of
    /// the named stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if `name` is absent. A
    /// `start` at or past the end yields an empty container.
    pub fn slice_by_number_from(&self, name: &str, start: usize) -> Result<CameraData> {
        let size = self.size(name)?;
        if start >= size {
            return Ok(self.empty_like());
        }
        self.slice_by_number(name, start, size - start)
    }

    /// Slices every stream, `name` included, to `[start_time, end_time)`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if `name` is absent.
    pub fn slice_by_time(&self, name: &str, start_time: i64, end_time: i64) -> Result<CameraData> {
        self.require(name)?;
        Ok(self.map_streams(|_, stream| stream.slice_time(start_time, end_time)))
    }

    /// [`slice_by_time`](Self::slice_by_time) up to and including the last
    /// element of the named stream.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError::UnknownStream`] if `name` is absent.
    pub fn slice_by_time_from(&self, name: &str, start_time: i64) -> Result<CameraData> {
        let end = self.time_window(name)?.end_time.saturating_add(1);
        self.slice_by_time(name, start_time, end)
    }

    /// Drops the first `count` elements of the named stream and every element
    /// older than `time` from the other streams.
    pub(crate) fn consume(&self, name: &str, count: usize, time: i64) -> CameraData {
        self.map_streams(|stream_name, stream| {
            if stream_name == name {
                stream.slice_from(count)
            } else {
                stream.slice_since(time)
            }
        })
    }

    /// Same stream names, kinds and metadata with no elements.
    #[must_use]
    pub fn empty_like(&self) -> CameraData {
        self.map_streams(|_, stream| stream.empty_like())
    }

    fn map_streams(&self, mut f: impl FnMut(&str, &StreamStore) -> StreamStore) -> CameraData {
        CameraData {
            streams: self
                .streams
                .iter()
                .map(|(name, stream)| (name.clone(), f(name, stream)))
                .collect(),
            resolutions: self.resolutions.clone(),
        }
    }

    fn require(&self, name: &str) -> Result<&StreamStore> {
        self.streams.get(name).ok_or_else(|| unknown_stream(name))
    }
}

fn unknown_stream(name: &str) -> crate::error::DvkitError {
    ContainerError::UnknownStream {
        name: name.to_string(),
    }
    .into()
}

fn kind_mismatch(
    name: &str,
    existing: StreamKind,
    incoming: StreamKind,
) -> crate::error::DvkitError {
    ContainerError::KindMismatch {
        name: name.to_string(),
        existing: existing.as_str(),
        incoming: incoming.as_str(),
    }
    .into()
}
