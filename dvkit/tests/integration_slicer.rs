//! Integration tests for the windowing engine.
//!
//! Snapshots are fed the way a live reader would produce them: small batches
//! per stream, in time order, possibly empty for some streams.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use bytes::Bytes;
use dvkit::container::{EVENTS, FRAMES};
use dvkit::{
    CameraData, DataSlicer, Event, Frame, JobConfig, PixelFormat, SliceInterval, SlicerPlan,
    TimeWindow,
};

#[derive(Debug, Clone, PartialEq)]
struct Emission {
    window: TimeWindow,
    events: Vec<i64>,
    frames: Vec<i64>,
}

type Log = Rc<RefCell<Vec<Emission>>>;

fn logging_callback(log: &Log) -> impl FnMut(&TimeWindow, &CameraData) + 'static {
    let log = Rc::clone(log);
    move |window, data| {
        log.borrow_mut().push(Emission {
            window: *window,
            events: data.events().map(|s| s.timestamps()).unwrap_or_default(),
            frames: data
                .frames()
                .map(|s| s.iter().map(|f| f.timestamp).collect())
                .unwrap_or_default(),
        });
    }
}

fn snapshot(events: &[i64], frames: &[i64]) -> CameraData {
    let mut data = CameraData::mono();
    for &t in events {
        data.events_mut().unwrap().append(Event::new(t, 0, 0, true)).unwrap();
    }
    for &t in frames {
        data.frames_mut()
            .unwrap()
            .append(Frame::new(t, 1, 1, PixelFormat::Gray, Bytes::from_static(&[9])))
            .unwrap();
    }
    data
}

#[test]
fn test_count_job_with_single_element_pushes() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer
        .do_every_number_of_elements(EVENTS, 2, logging_callback(&log))
        .unwrap();

    for t in [0, 10, 20, 30, 40, 50] {
        slicer.accept(&snapshot(&[t], &[])).unwrap();
    }

    let events: Vec<Vec<i64>> = log.borrow().iter().map(|e| e.events.clone()).collect();
    assert_eq!(events, vec![vec![0, 10], vec![20, 30], vec![40, 50]]);
}

#[test]
fn test_time_job_batch_then_completion() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer
        .do_every_time_interval(EVENTS, Duration::from_micros(20), logging_callback(&log))
        .unwrap();

    slicer.accept(&snapshot(&[0, 5, 19, 25, 31], &[])).unwrap();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].window, TimeWindow::new(0, 20));
    assert_eq!(log.borrow()[0].events, vec![0, 5, 19]);

    slicer.accept(&snapshot(&[39], &[])).unwrap();
    assert_eq!(log.borrow().len(), 1);

    slicer.accept(&snapshot(&[40], &[])).unwrap();
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(log.borrow()[1].window, TimeWindow::new(20, 40));
    assert_eq!(log.borrow()[1].events, vec![25, 31, 39]);
}

#[test]
fn test_frames_follow_event_windows() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer
        .do_every_time_interval(EVENTS, Duration::from_micros(100), logging_callback(&log))
        .unwrap();

    // Frames arrive ahead of events and must wait for their window.
    slicer.accept(&snapshot(&[0, 50], &[10, 150])).unwrap();
    slicer.accept(&snapshot(&[120, 199], &[])).unwrap();
    slicer.accept(&snapshot(&[200], &[210])).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].frames, vec![10]);
    assert_eq!(log[1].events, vec![120, 199]);
    assert_eq!(log[1].frames, vec![150]);
}

#[test]
fn test_boundary_frame_not_repeated_in_count_mode() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer
        .do_every_number_of_elements(EVENTS, 2, logging_callback(&log))
        .unwrap();

    slicer.accept(&snapshot(&[0, 10, 10, 20], &[10, 15])).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].frames, vec![10]);
    assert_eq!(log[1].frames, vec![15]);
}

#[test]
fn test_every_element_emitted_exactly_once() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer
        .do_every_number_of_elements(EVENTS, 7, logging_callback(&log))
        .unwrap();

    let all: Vec<i64> = (0..100).collect();
    for chunk in all.chunks(9) {
        slicer.accept(&snapshot(chunk, &[])).unwrap();
    }

    let emitted: Vec<i64> = log.borrow().iter().flat_map(|e| e.events.clone()).collect();
    assert_eq!(emitted, (0..98).collect::<Vec<_>>());
    assert!(log.borrow().iter().all(|e| e.events.len() == 7));
}

#[test]
fn test_interval_change_takes_effect_on_next_accept() {
    let log = Log::default();
    let mut slicer = DataSlicer::new();
    let id = slicer
        .do_every_number_of_elements(EVENTS, 4, logging_callback(&log))
        .unwrap();

    slicer.accept(&snapshot(&[0, 1, 2], &[])).unwrap();
    slicer.modify_number_interval(id, 2).unwrap();
    slicer.accept(&snapshot(&[3], &[])).unwrap();

    let sizes: Vec<usize> = log.borrow().iter().map(|e| e.events.len()).collect();
    assert_eq!(sizes, vec![2, 2]);

    slicer.remove_job(id);
    slicer.accept(&snapshot(&[4, 5, 6, 7], &[])).unwrap();
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn test_jobs_from_plan_watch_different_streams() {
    let plan = SlicerPlan {
        jobs: vec![
            JobConfig {
                stream: EVENTS.to_string(),
                every: SliceInterval::Elements(3),
            },
            JobConfig {
                stream: FRAMES.to_string(),
                every: SliceInterval::Elements(1),
            },
        ],
    };
    let event_log = Log::default();
    let frame_log = Log::default();
    let mut slicer = DataSlicer::new();
    slicer.register(&plan.jobs[0], logging_callback(&event_log)).unwrap();
    slicer.register(&plan.jobs[1], logging_callback(&frame_log)).unwrap();

    slicer.accept(&snapshot(&[0, 1, 2, 3], &[1, 3])).unwrap();
    assert_eq!(event_log.borrow().len(), 1);
    assert_eq!(event_log.borrow()[0].frames, vec![1]);

    let frame_log = frame_log.borrow();
    assert_eq!(frame_log.len(), 2);
    assert_eq!(frame_log[0].events, vec![1]);
    assert_eq!(frame_log[1].window, TimeWindow::new(3, 3));
}
