//! Frame samples: full images captured by the sensor's APS readout or
//! reconstructed from events.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::element::Timestamped;
use crate::store::Store;

/// Origin of a frame image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSource {
    /// Unspecified origin.
    #[default]
    Undefined,
    /// Captured directly by the sensor.
    Sensor,
    /// Accumulated from events.
    Accumulation,
    /// Produced by motion compensation.
    MotionCompensation,
    /// Synthetic image from a simulator.
    Synthetic,
    /// Reconstructed by an external algorithm.
    Reconstruction,
    /// Visualization output.
    Visualization,
    /// Anything else.
    Other,
}

/// Pixel layout of a frame image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// One byte per pixel.
    #[default]
    Gray,
    /// Three bytes per pixel, blue-green-red order.
    Bgr,
    /// Four bytes per pixel, blue-green-red-alpha order.
    Bgra,
}

impl PixelFormat {
    /// Number of bytes each pixel occupies.
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Bgr => 3,
            Self::Bgra => 4,
        }
    }
}

/// A single image with its capture metadata.
///
/// Pixels are held in a reference-counted [`Bytes`] buffer, so slicing a
/// frame store never copies image data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp in microseconds.
    pub timestamp: i64,
    /// Exposure time in microseconds.
    pub exposure: i64,
    /// Where the image came from.
    pub source: FrameSource,
    /// Image width in pixels.
    pub width: u16,
    /// Image height in pixels.
    pub height: u16,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Row-major pixel data.
    pub pixels: Bytes,
}

impl Frame {
    /// Creates a sensor frame with zero exposure.
    pub fn new(
        timestamp: i64,
        width: u16,
        height: u16,
        format: PixelFormat,
        pixels: Bytes,
    ) -> Self {
        Self {
            timestamp,
            exposure: 0,
            source: FrameSource::Sensor,
            width,
            height,
            format,
            pixels,
        }
    }

    /// Whether the pixel buffer matches `width * height * channels`.
    pub fn is_consistent(&self) -> bool {
        usize::from(self.width) * usize::from(self.height) * self.format.channels()
            == self.pixels.len()
    }
}

impl Timestamped for Frame {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Store of frames.
pub type FrameStore = Store<Frame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_consistency() {
        let frame = Frame::new(5, 4, 2, PixelFormat::Bgr, Bytes::from(vec![0u8; 24]));
        assert!(frame.is_consistent());
        assert_eq!(frame.timestamp(), 5);

        let short = Frame::new(5, 4, 2, PixelFormat::Gray, Bytes::from_static(&[1, 2, 3]));
        assert!(!short.is_consistent());
    }
}
