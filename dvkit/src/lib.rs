//! # dvkit
//!
//! Sharded, time-ordered sample storage and windowed slicing for event-camera
//! recordings.
//!
//! dvkit holds the high-rate streams of an event-camera session (point events,
//! frames, IMU samples, trigger marks) in memory and cuts them into
//! time-aligned windows for downstream processing.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - Slicing by count or by time copies shard descriptors, never elements
//! - Logarithmic lookups for both count and time boundaries
//! - Half-open, lower-bound time slicing: adjacent windows never overlap
//! - Strict nondecreasing-timestamp ingestion, enforced on every append
//! - Single-threaded and synchronous: no background threads, no locking
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use dvkit::{CameraData, DataSlicer, Resolution};
//! use dvkit::simulation::generate_sample_events;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Ten thousand events, one every 10us.
//! let events = generate_sample_events(Resolution::new(346, 260), 10_000, 0, 10, 0);
//!
//! let mut data = CameraData::mono();
//! data.insert("events", events);
//!
//! // Emit one slice per 33ms of event time.
//! let mut slicer = DataSlicer::new();
//! slicer.do_every_time_interval("events", Duration::from_millis(33), |window, slice| {
//!     println!("{window}: {} events", slice.size("events").unwrap_or(0));
//! })?;
//! slicer.accept(&data)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Store`]: sharded, time-ordered container for one element kind
//! - [`CameraData`]: name-keyed set of stores with time-aligned slicing
//! - [`DataSlicer`]: count- and time-based windowing over incoming snapshots
//!
//! ## Modules
//!
//! - [`element`]: the `Timestamped` trait, time windows and packets
//! - [`event`], [`frame`], [`imu`], [`trigger`]: element kinds
//! - [`shard`]: capacity-tracked storage segments
//! - [`store`]: the multi-shard store
//! - [`iter`]: cross-shard cursor and iterator
//! - [`container`]: composite, name-keyed container
//! - [`slicer`]: windowing engine
//! - [`config`]: store and slicing-plan configuration
//! - [`export`]: CSV and JSON-lines output
//! - [`simulation`]: synthetic event generation
//! - [`error`]: error types

pub mod config;
pub mod container;
pub mod element;
pub mod error;
pub mod event;
pub mod export;
pub mod frame;
pub mod imu;
pub mod iter;
pub mod shard;
pub mod simulation;
pub mod slicer;
pub mod store;
pub mod trigger;

// Re-export primary API types at crate root for convenience.
pub use config::{JobConfig, SliceInterval, SlicerPlan, StoreConfig};
pub use container::{CameraData, Resolution, StreamKind, StreamStore};
pub use element::{Packet, TimeWindow, Timestamped};
pub use error::{DvkitError, Result};
pub use event::{Event, EventStore};
pub use frame::{Frame, FrameSource, FrameStore, PixelFormat};
pub use imu::{Imu, ImuStore};
pub use slicer::{DataSlicer, JobId};
pub use store::Store;
pub use trigger::{Trigger, TriggerStore, TriggerType};
