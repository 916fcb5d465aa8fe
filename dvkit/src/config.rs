//! Configuration types for stores and slicing plans.
//!
//! Everything here is plain serde data with a `validate()` step, so plans can
//! be written as JSON and checked before anything is built from them.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Number of elements a growable shard holds unless configured otherwise.
pub const DEFAULT_SHARD_CAPACITY: usize = 10_000;

/// Configuration for a single [`Store`](crate::store::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Capacity of each growable shard, in elements.
    pub shard_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_capacity: DEFAULT_SHARD_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `shard_capacity` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.shard_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "shard_capacity must be > 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// How often a slicing job emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceInterval {
    /// Every `n` elements of the watched stream.
    Elements(usize),
    /// Every `n` microseconds of the watched stream.
    Micros(i64),
}

impl SliceInterval {
    /// Whether the interval is usable (non-zero count, positive duration).
    pub const fn is_valid(&self) -> bool {
        match *self {
            Self::Elements(n) => n > 0,
            Self::Micros(us) => us > 0,
        }
    }

    /// Name of the slicing mode.
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Elements(_) => "number",
            Self::Micros(_) => "time",
        }
    }
}

/// One slicing job: the stream it watches and how often it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Name of the watched stream.
    pub stream: String,
    /// Emission interval.
    pub every: SliceInterval,
}

impl JobConfig {
    /// Validates the job.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty stream name or a
    /// non-positive interval.
    pub fn validate(&self) -> Result<()> {
        if self.stream.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "job stream name must not be empty".to_string(),
            }
            .into());
        }
        if !self.every.is_valid() {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "job on '{}' has a non-positive {} interval",
                    self.stream,
                    self.every.mode()
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// A set of slicing jobs, typically loaded from JSON.
///
/// # Example
///
/// ```rust
/// use dvkit::config::{SlicerPlan, SliceInterval};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let plan = SlicerPlan::from_json_str(r#"{
///     "jobs": [
///         { "stream": "events", "every": { "elements": 5000 } },
///         { "stream": "events", "every": { "micros": 33000 } }
///     ]
/// }"#)?;
/// assert_eq!(plan.jobs[1].every, SliceInterval::Micros(33_000));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlicerPlan {
    /// Jobs in registration order.
    pub jobs: Vec<JobConfig>,
}

impl SlicerPlan {
    /// Parses and validates a plan from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, or
    /// [`ConfigError::Invalid`] if any job fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let plan: Self =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validates every job.
    ///
    /// # Errors
    ///
    /// Returns the first job's validation error.
    pub fn validate(&self) -> Result<()> {
        self.jobs.iter().try_for_each(JobConfig::validate)
    }
}
