//! Trigger marks from the camera's external synchronization input.

use serde::{Deserialize, Serialize};

use crate::element::Timestamped;
use crate::store::Store;

/// Kind of signal edge or event a trigger records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Counter reset.
    #[default]
    TimestampReset,
    /// Rising edge on the external input.
    ExternalSignalRisingEdge,
    /// Falling edge on the external input.
    ExternalSignalFallingEdge,
    /// Pulse on the external input.
    ExternalSignalPulse,
    /// Rising edge on the external generator.
    ExternalGeneratorRisingEdge,
    /// Falling edge on the external generator.
    ExternalGeneratorFallingEdge,
    /// Start of a frame readout.
    ApsFrameStart,
    /// End of a frame readout.
    ApsFrameEnd,
    /// Start of an exposure.
    ApsExposureStart,
    /// End of an exposure.
    ApsExposureEnd,
}

/// A timestamped trigger mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    /// Timestamp in microseconds.
    pub timestamp: i64,
    /// What the trigger records.
    pub kind: TriggerType,
}

impl Trigger {
    /// Creates a trigger mark.
    pub const fn new(timestamp: i64, kind: TriggerType) -> Self {
        Self { timestamp, kind }
    }
}

impl Timestamped for Trigger {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Store of trigger marks.
pub type TriggerStore = Store<Trigger>;
