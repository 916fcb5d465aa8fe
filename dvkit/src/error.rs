//! Error types for dvkit storage and slicing.

use thiserror::Error;

/// The main error type for all dvkit operations.
///
/// Every failure is local and synchronous: the receiver of the failing call is
/// left unchanged, and nothing is retried or suppressed internally.
#[derive(Error, Debug)]
pub enum DvkitError {
    /// Error from a single shard window operation.
    #[error("shard error: {0}")]
    Shard(#[from] ShardError),

    /// Error from a store operation (ordering, ranges, arguments).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from a composite container operation.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// Error from the windowing engine.
    #[error("slicer error: {0}")]
    Slicer(#[from] SlicerError),

    /// Error while validating or loading configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error while exporting elements to an external format.
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised by [`Shard`](crate::shard::Shard) window operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    /// Trimming more elements than the shard currently holds.
    #[error("cannot trim {requested} elements from a shard of length {length}")]
    TrimOutOfRange {
        /// Number of elements requested to trim.
        requested: usize,
        /// Current logical length of the shard.
        length: usize,
    },
}

/// Errors raised by [`Store`](crate::store::Store) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Incoming data is older than what the store already holds.
    #[error("out-of-order data: incoming timestamp {incoming} is older than highest stored timestamp {highest}")]
    OutOfOrder {
        /// Highest timestamp currently stored.
        highest: i64,
        /// Timestamp of the offending element.
        incoming: i64,
    },

    /// A packet handed to the store is not internally nondecreasing.
    #[error("packet is not sorted by timestamp at index {index}")]
    UnsortedPacket {
        /// Index of the first element older than its predecessor.
        index: usize,
    },

    /// A count-based range reaches past the end of the store.
    #[error("range {start}+{length} exceeds store size {size}")]
    RangeOutOfBounds {
        /// Start index of the requested range.
        start: usize,
        /// Length of the requested range.
        length: usize,
        /// Number of elements in the store.
        size: usize,
    },

    /// A single index is outside the store.
    #[error("index {index} out of bounds for store of size {size}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of elements in the store.
        size: usize,
    },

    /// A time range with its start after its end.
    #[error("invalid time range: start {start} > end {end}")]
    InvalidTimeRange {
        /// Start of the range in microseconds.
        start: i64,
        /// End of the range in microseconds.
        end: i64,
    },

    /// Down-sampling factor of zero.
    #[error("down-sample factor must be positive")]
    InvalidDownSampleFactor,
}

/// Errors raised by [`CameraData`](crate::container::CameraData).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// The named stream is not present in the container.
    #[error("unknown stream '{name}'")]
    UnknownStream {
        /// Name that was looked up.
        name: String,
    },

    /// Two streams with the same name hold different element kinds.
    #[error("stream '{name}' holds {existing} but {incoming} were supplied")]
    KindMismatch {
        /// Stream name.
        name: String,
        /// Kind already stored under the name.
        existing: &'static str,
        /// Kind of the data being merged.
        incoming: &'static str,
    },
}

/// Errors raised by the [`DataSlicer`](crate::slicer::DataSlicer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlicerError {
    /// Reconfiguring a job with an interval of the other mode.
    #[error("job {job} slices by {actual}, cannot set a {requested} interval")]
    IntervalModeMismatch {
        /// Id of the job.
        job: u64,
        /// Mode the job was registered with.
        actual: &'static str,
        /// Mode of the requested interval.
        requested: &'static str,
    },

    /// Zero element count or non-positive time interval.
    #[error("slicing interval must be positive")]
    InvalidInterval,
}

/// Errors raised while validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while exporting elements.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested output format is not recognized.
    #[error("unsupported export format '{format}'")]
    UnsupportedFormat {
        /// The format name that was requested.
        format: String,
    },

    /// Writing to the sink failed.
    #[error("failed to write export output: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing an element failed.
    #[error("failed to serialize element: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Type alias for `Result<T, DvkitError>`.
pub type Result<T> = std::result::Result<T, DvkitError>;
