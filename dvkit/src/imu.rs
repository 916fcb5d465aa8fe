//! Inertial measurement samples.

use serde::{Deserialize, Serialize};

use crate::element::Timestamped;
use crate::store::Store;

/// One sample from the inertial measurement unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Imu {
    /// Sample timestamp in microseconds.
    pub timestamp: i64,
    /// Die temperature in degrees Celsius.
    pub temperature: f32,
    /// Acceleration along x, y, z in g.
    pub accelerometer: [f32; 3],
    /// Angular velocity around x, y, z in degrees per second.
    pub gyroscope: [f32; 3],
    /// Magnetic field along x, y, z in microtesla.
    pub magnetometer: [f32; 3],
}

impl Imu {
    /// Creates a six-axis sample with no temperature or magnetometer reading.
    pub const fn new(timestamp: i64, accelerometer: [f32; 3], gyroscope: [f32; 3]) -> Self {
        Self {
            timestamp,
            temperature: 0.0,
            accelerometer,
            gyroscope,
            magnetometer: [0.0; 3],
        }
    }
}

impl Timestamped for Imu {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Store of IMU samples.
pub type ImuStore = Store<Imu>;
