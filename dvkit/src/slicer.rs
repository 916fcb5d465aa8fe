//! Windowed re-emission of accumulated stream data.
//!
//! A [`DataSlicer`] holds any number of independent jobs. Each job watches
//! one named stream, buffers every [`CameraData`] snapshot handed to
//! [`DataSlicer::accept`], and invokes its callback once per complete window:
//!
//! - **Number mode**: every `n` elements of the watched stream. The callback
//!   gets the time window of the emitted elements.
//! - **Time mode**: every `interval` microseconds of the watched stream. The
//!   callback gets the nominal window `[t, t + interval)`.
//!
//! Other streams in the snapshot are carried along and cut to each window.
//! After emitting, a job drops the data it has consumed, so every element is
//! emitted to a given job at most once.
//!
//! # Registration Flow
//!
//! 1. Register a job with [`DataSlicer::do_every_number_of_elements`],
//!    [`DataSlicer::do_every_time_interval`] or [`DataSlicer::register`]
//! 2. Keep the returned [`JobId`] to reconfigure or remove the job later
//! 3. Feed snapshots through [`DataSlicer::accept`]; jobs run in
//!    registration order
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use dvkit::{CameraData, DataSlicer, Event};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let windows = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&windows);
//!
//! let mut slicer = DataSlicer::new();
//! slicer.do_every_number_of_elements("events", 2, move |window, _data| {
//!     sink.borrow_mut().push(*window);
//! })?;
//!
//! for t in [0, 10, 20, 30, 40, 50] {
//!     let mut data = CameraData::mono();
//!     data.events_mut()?.append(Event::new(t, 0, 0, true))?;
//!     slicer.accept(&data)?;
//! }
//! assert_eq!(windows.borrow().len(), 3);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::config::{JobConfig, SliceInterval};
use crate::container::CameraData;
use crate::element::TimeWindow;
use crate::error::{Result, SlicerError};

/// Callback invoked with the window and the data of each emitted slice.
pub type SliceCallback = Box<dyn FnMut(&TimeWindow, &CameraData)>;

/// Identifier of a registered job, unique within one [`DataSlicer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subscription: buffered data plus emission cursors.
struct SliceJob {
    stream: String,
    interval: SliceInterval,
    buffer: CameraData,
    /// Earliest time not yet covered by an emitted window; set from the first
    /// data seen.
    last_time: Option<i64>,
    callback: SliceCallback,
}

impl fmt::Debug for SliceJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceJob")
            .field("stream", &self.stream)
            .field("interval", &self.interval)
            .field("last_time", &self.last_time)
            .finish_non_exhaustive()
    }
}

impl SliceJob {
    fn run(&mut self, snapshot: &CameraData) -> Result<()> {
        if snapshot.get(&self.stream).is_none_or(|s| s.is_empty()) {
            return Ok(());
        }
        self.buffer.add(snapshot)?;

        let buffered = self.buffer.time_window(&self.stream)?;
        let end_time = buffered.end_time;
        let mut last_time = *self.last_time.get_or_insert(buffered.start_time);
        let mut emitted = 0usize;

        match self.interval {
            SliceInterval::Elements(n) => {
                while self.buffer.size(&self.stream)? >= n {
                    let slice = self.buffer.slice_by_number(&self.stream, 0, n)?;
                    let window = slice.time_window(&self.stream)?;
                    // Other streams were cut inclusively at `window.end_time`.
                    last_time = window.end_time.saturating_add(1);
                    (self.callback)(&window, &slice);
                    self.buffer = self.buffer.consume(&self.stream, n, last_time);
                    emitted += 1;
                }
            }
            SliceInterval::Micros(interval) => {
                while end_time - last_time >= interval {
                    let end = last_time + interval;
                    let slice = self.buffer.slice_by_time(&self.stream, last_time, end)?;
                    let consumed = slice.size(&self.stream)?;
                    (self.callback)(&TimeWindow::new(last_time, end), &slice);
                    last_time = end;
                    self.buffer = self.buffer.consume(&self.stream, consumed, last_time);
                    emitted += 1;
                }
            }
        }

        self.last_time = Some(last_time);
        if emitted > 0 {
            tracing::trace!(
                stream = %self.stream,
                emitted,
                buffered = self.buffer.size(&self.stream)?,
                "slice job emitted"
            );
        }
        Ok(())
    }
}

/// Runs count- and time-based slicing jobs over incoming snapshots.
#[derive(Debug, Default)]
pub struct DataSlicer {
    next_id: u64,
    jobs: BTreeMap<JobId, SliceJob>,
}

impl DataSlicer {
    /// Creates a slicer with no jobs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a snapshot to every job in registration order.
    ///
    /// Jobs whose watched stream is empty or missing in the snapshot skip it.
    ///
    /// # Errors
    ///
    /// Returns the first job error, typically an ordering violation when the
    /// snapshot is older than data the job already holds. Jobs after the
    /// failing one do not see the snapshot.
    pub fn accept(&mut self, snapshot: &CameraData) -> Result<()> {
        for job in self.jobs.values_mut() {
            job.run(snapshot)?;
        }
        Ok(())
    }

    /// Registers a job that fires every `n` elements of `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidInterval`] if `n` is 0.
    pub fn do_every_number_of_elements(
        &mut self,
        stream: impl Into<String>,
        n: usize,
        callback: impl FnMut(&TimeWindow, &CameraData) + 'static,
    ) -> Result<JobId> {
        self.add_job(stream.into(), SliceInterval::Elements(n), Box::new(callback))
    }

    /// Registers a job that fires every `interval` of `stream` time.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidInterval`] if `interval` is shorter than
    /// one microsecond.
    pub fn do_every_time_interval(
        &mut self,
        stream: impl Into<String>,
        interval: Duration,
        callback: impl FnMut(&TimeWindow, &CameraData) + 'static,
    ) -> Result<JobId> {
        let micros = duration_to_micros(interval)?;
        self.add_job(stream.into(), SliceInterval::Micros(micros), Box::new(callback))
    }

    /// Registers a job described by configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the job fails validation.
    pub fn register(
        &mut self,
        config: &JobConfig,
        callback: impl FnMut(&TimeWindow, &CameraData) + 'static,
    ) -> Result<JobId> {
        config.validate()?;
        self.add_job(config.stream.clone(), config.every, Box::new(callback))
    }

    /// Removes a job. Returns whether it existed; unknown ids are ignored.
    pub fn remove_job(&mut self, id: JobId) -> bool {
        let removed = self.jobs.remove(&id).is_some();
        if removed {
            tracing::debug!(job = %id, "slice job removed");
        }
        removed
    }

    /// Whether a job with this id is registered.
    pub fn has_job(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Changes the element count of a number-mode job.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidInterval`] if `n` is 0, or
    /// [`SlicerError::IntervalModeMismatch`] if the job slices by time.
    pub fn modify_number_interval(&mut self, id: JobId, n: usize) -> Result<()> {
        self.modify(id, SliceInterval::Elements(n))
    }

    /// Changes the interval of a time-mode job.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SlicerError::InvalidInterval`] if `interval` is shorter than
    /// one microsecond, or [`SlicerError::IntervalModeMismatch`] if the job
    /// slices by element count.
    pub fn modify_time_interval(&mut self, id: JobId, interval: Duration) -> Result<()> {
        let micros = duration_to_micros(interval)?;
        self.modify(id, SliceInterval::Micros(micros))
    }

    fn modify(&mut self, id: JobId, interval: SliceInterval) -> Result<()> {
        if !interval.is_valid() {
            return Err(SlicerError::InvalidInterval.into());
        }
        let Some(job) = self.jobs.get_mut(&id) else {
            tracing::warn!(job = %id, "ignoring interval change for unknown slice job");
            return Ok(());
        };
        if std::mem::discriminant(&job.interval) != std::mem::discriminant(&interval) {
            return Err(SlicerError::IntervalModeMismatch {
                job: id.get(),
                actual: job.interval.mode(),
                requested: interval.mode(),
            }
            .into());
        }
        job.interval = interval;
        Ok(())
    }

    fn add_job(
        &mut self,
        stream: String,
        interval: SliceInterval,
        callback: SliceCallback,
    ) -> Result<JobId> {
        if !interval.is_valid() {
            return Err(SlicerError::InvalidInterval.into());
        }
        let id = JobId(self.next_id);
        self.next_id += 1;
        tracing::debug!(job = %id, stream = %stream, ?interval, "slice job registered");
        self.jobs.insert(
            id,
            SliceJob {
                stream,
                interval,
                buffer: CameraData::customized(),
                last_time: None,
                callback,
            },
        );
        Ok(id)
    }
}

fn duration_to_micros(interval: Duration) -> Result<i64> {
    match i64::try_from(interval.as_micros()) {
        Ok(micros) if micros > 0 => Ok(micros),
        _ => Err(SlicerError::InvalidInterval.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::container::EVENTS;
    use crate::error::DvkitError;
    use crate::event::Event;

    type Emitted = Rc<RefCell<Vec<(TimeWindow, Vec<i64>)>>>;

    fn recorder() -> (Emitted, impl FnMut(&TimeWindow, &CameraData) + 'static) {
        let emitted: Emitted = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&emitted);
        let callback = move |window: &TimeWindow, data: &CameraData| {
            let times = data.events().unwrap().timestamps();
            sink.borrow_mut().push((*window, times));
        };
        (emitted, callback)
    }

    fn events(ts: &[i64]) -> CameraData {
        let mut data = CameraData::mono();
        for &t in ts {
            data.events_mut().unwrap().append(Event::new(t, 0, 0, true)).unwrap();
        }
        data
    }

    #[test]
    fn test_number_job_emits_pairs() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        slicer.do_every_number_of_elements(EVENTS, 2, callback).unwrap();

        for t in [0, 10, 20, 30, 40, 50] {
            slicer.accept(&events(&[t])).unwrap();
        }

        let emitted = emitted.borrow();
        let slices: Vec<Vec<i64>> = emitted.iter().map(|(_, t)| t.clone()).collect();
        assert_eq!(slices, vec![vec![0, 10], vec![20, 30], vec![40, 50]]);
        assert_eq!(emitted[1].0, TimeWindow::new(20, 30));
    }

    #[test]
    fn test_time_job_holds_incomplete_window() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        slicer
            .do_every_time_interval(EVENTS, Duration::from_micros(20), callback)
            .unwrap();

        slicer.accept(&events(&[0, 5, 19, 25, 31])).unwrap();
        assert_eq!(emitted.borrow().len(), 1);
        assert_eq!(emitted.borrow()[0], (TimeWindow::new(0, 20), vec![0, 5, 19]));

        slicer.accept(&events(&[40])).unwrap();
        assert_eq!(emitted.borrow().len(), 2);
        assert_eq!(emitted.borrow()[1], (TimeWindow::new(20, 40), vec![25, 31]));
    }

    #[test]
    fn test_time_job_emits_empty_windows_across_gaps() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        slicer
            .do_every_time_interval(EVENTS, Duration::from_micros(10), callback)
            .unwrap();

        slicer.accept(&events(&[0, 35])).unwrap();
        let windows: Vec<TimeWindow> = emitted.borrow().iter().map(|(w, _)| *w).collect();
        assert_eq!(
            windows,
            vec![
                TimeWindow::new(0, 10),
                TimeWindow::new(10, 20),
                TimeWindow::new(20, 30)
            ]
        );
        assert!(emitted.borrow()[1].1.is_empty());
    }

    #[test]
    fn test_first_timestamp_zero_is_tracked() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        slicer
            .do_every_time_interval(EVENTS, Duration::from_micros(5), callback)
            .unwrap();
        slicer.accept(&events(&[0])).unwrap();
        slicer.accept(&events(&[7])).unwrap();
        assert_eq!(emitted.borrow()[0], (TimeWindow::new(0, 5), vec![0]));
    }

    #[test]
    fn test_empty_snapshot_is_ignored() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        slicer.do_every_number_of_elements(EVENTS, 1, callback).unwrap();
        slicer.accept(&CameraData::mono()).unwrap();
        slicer.accept(&CameraData::customized()).unwrap();
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_jobs_are_independent() {
        let (pairs, pair_cb) = recorder();
        let (triples, triple_cb) = recorder();
        let mut slicer = DataSlicer::new();
        let a = slicer.do_every_number_of_elements(EVENTS, 2, pair_cb).unwrap();
        let b = slicer.do_every_number_of_elements(EVENTS, 3, triple_cb).unwrap();
        assert!(a < b);

        slicer.accept(&events(&[1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(pairs.borrow().len(), 3);
        assert_eq!(triples.borrow().len(), 2);
    }

    #[test]
    fn test_modify_and_remove() {
        let (_, number_cb) = recorder();
        let (_, time_cb) = recorder();
        let mut slicer = DataSlicer::new();
        let number = slicer.do_every_number_of_elements(EVENTS, 2, number_cb).unwrap();
        let time = slicer
            .do_every_time_interval(EVENTS, Duration::from_millis(1), time_cb)
            .unwrap();

        slicer.modify_number_interval(number, 4).unwrap();
        slicer
            .modify_time_interval(time, Duration::from_millis(2))
            .unwrap();

        assert!(matches!(
            slicer.modify_time_interval(number, Duration::from_millis(1)).unwrap_err(),
            DvkitError::Slicer(SlicerError::IntervalModeMismatch { .. })
        ));
        assert!(matches!(
            slicer.modify_number_interval(time, 3).unwrap_err(),
            DvkitError::Slicer(SlicerError::IntervalModeMismatch { .. })
        ));
        assert!(slicer.modify_number_interval(number, 0).is_err());

        assert!(slicer.remove_job(number));
        assert!(!slicer.has_job(number));
        assert!(!slicer.remove_job(number));
        slicer.modify_number_interval(number, 2).unwrap();
        assert_eq!(slicer.job_count(), 1);
    }

    #[test]
    fn test_invalid_intervals_rejected() {
        let mut slicer = DataSlicer::new();
        assert!(slicer.do_every_number_of_elements(EVENTS, 0, |_, _| {}).is_err());
        assert!(
            slicer
                .do_every_time_interval(EVENTS, Duration::from_nanos(10), |_, _| {})
                .is_err()
        );
        assert_eq!(slicer.job_count(), 0);
    }

    #[test]
    fn test_out_of_order_snapshot_fails() {
        let mut slicer = DataSlicer::new();
        slicer.do_every_number_of_elements(EVENTS, 10, |_, _| {}).unwrap();
        slicer.accept(&events(&[100])).unwrap();
        assert!(slicer.accept(&events(&[50])).is_err());
        slicer.accept(&events(&[100, 101])).unwrap();
    }

    #[test]
    fn test_register_from_config() {
        let (emitted, callback) = recorder();
        let mut slicer = DataSlicer::new();
        let config = JobConfig {
            stream: EVENTS.to_string(),
            every: SliceInterval::Elements(1),
        };
        slicer.register(&config, callback).unwrap();
        slicer.accept(&events(&[3, 4])).unwrap();
        assert_eq!(emitted.borrow().len(), 2);
    }
}
