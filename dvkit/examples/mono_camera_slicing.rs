//! Example demonstrating time-aligned slicing of a mono camera session.
//!
//! This example shows how to:
//! - Fill a `CameraData` with synthetic events and frames
//! - Cut all streams by an event count
//! - Register count- and time-based slicing jobs and feed them in batches

use std::time::Duration;

use bytes::Bytes;
use dvkit::container::{EVENTS, FRAMES};
use dvkit::error::Result;
use dvkit::simulation::generate_sample_events;
use dvkit::{CameraData, DataSlicer, Frame, PixelFormat, Resolution};

fn main() -> Result<()> {
    println!("dvkit mono camera slicing example");

    let resolution = Resolution::new(346, 260);
    let mut data = CameraData::mono();
    data.set_resolution(EVENTS, resolution);

    // 100k events at 10us spacing, one frame every 33ms.
    let events = generate_sample_events(resolution, 100_000, 0, 10, 0);
    let end = events.highest_time();
    data.insert(EVENTS, events);
    for t in (0..=end).step_by(33_000) {
        let area = usize::from(resolution.width) * usize::from(resolution.height);
        let pixels = Bytes::from(vec![128u8; area]);
        data.frames_mut()?.append(Frame::new(
            t,
            resolution.width,
            resolution.height,
            PixelFormat::Gray,
            pixels,
        ))?;
    }
    println!("events: {}", data.events()?);
    println!("frames: {}", data.frames()?);

    // Cut every stream to the time span of 5000 events.
    let slice = data.slice_by_number(EVENTS, 10_000, 5_000)?;
    println!(
        "slice_by_number: {} events in {}, {} frame(s)",
        slice.size(EVENTS)?,
        slice.time_window(EVENTS)?,
        slice.size(FRAMES)?
    );

    let mut slicer = DataSlicer::new();
    slicer.do_every_number_of_elements(EVENTS, 25_000, |window, slice| {
        println!(
            "  [count] {window}: {} events, {} frame(s)",
            slice.size(EVENTS).unwrap_or(0),
            slice.size(FRAMES).unwrap_or(0)
        );
    })?;
    slicer.do_every_time_interval(EVENTS, Duration::from_millis(250), |window, slice| {
        println!(
            "  [time]  {window}: {} events",
            slice.size(EVENTS).unwrap_or(0)
        );
    })?;

    // Feed the session in 50ms snapshots, the way a live reader would.
    let step = 50_000;
    let mut from = 0;
    while from <= end {
        let snapshot = data.slice_by_time(EVENTS, from, from + step)?;
        slicer.accept(&snapshot)?;
        from += step;
    }

    println!("done");
    Ok(())
}
