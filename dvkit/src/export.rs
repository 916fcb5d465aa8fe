//! Writing stores out in flat text formats.
//!
//! Two formats are supported:
//!
//! - `csv`: a header line followed by one row per element
//! - `jsonl`: one JSON object per element per line
//!
//! Any other format name is rejected with
//! [`ExportError::UnsupportedFormat`].

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use serde::Serialize;

use crate::element::Timestamped;
use crate::error::{ExportError, Result};
use crate::event::Event;
use crate::frame::Frame;
use crate::imu::Imu;
use crate::store::Store;
use crate::trigger::Trigger;

/// Output format for exported elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Comma-separated values with a header line.
    Csv,
    /// Newline-delimited JSON objects.
    JsonLines,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "ndjson" | "json-lines" => Ok(Self::JsonLines),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::JsonLines => f.write_str("jsonl"),
        }
    }
}

/// Elements that can be written as one CSV row.
pub trait CsvRecord {
    /// Header line, without the trailing newline.
    const HEADER: &'static str;

    /// Writes the row for this element, without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    fn write_row<W: Write>(&self, out: &mut W) -> std::io::Result<()>;
}

impl CsvRecord for Event {
    const HEADER: &'static str = "timestamp,x,y,polarity";

    fn write_row<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(
            out,
            "{},{},{},{}",
            self.timestamp,
            self.x,
            self.y,
            u8::from(self.polarity)
        )
    }
}

impl CsvRecord for Frame {
    // Pixel data does not fit a CSV cell; only its size is written.
    const HEADER: &'static str = "timestamp,exposure,source,width,height,format,bytes";

    fn write_row<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(
            out,
            "{},{},{:?},{},{},{:?},{}",
            self.timestamp,
            self.exposure,
            self.source,
            self.width,
            self.height,
            self.format,
            self.pixels.len()
        )
    }
}

impl CsvRecord for Imu {
    const HEADER: &'static str = "timestamp,temperature,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z,mag_x,mag_y,mag_z";

    fn write_row<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{},{}", self.timestamp, self.temperature)?;
        for value in self
            .accelerometer
            .iter()
            .chain(&self.gyroscope)
            .chain(&self.magnetometer)
        {
            write!(out, ",{value}")?;
        }
        Ok(())
    }
}

impl CsvRecord for Trigger {
    const HEADER: &'static str = "timestamp,kind";

    fn write_row<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "{},{:?}", self.timestamp, self.kind)
    }
}

/// Writes every element of `store` to `out` in the given format.
///
/// Returns the number of elements written.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if writing fails, or
/// [`ExportError::Serialize`] if an element cannot be encoded as JSON.
///
/// # Examples
///
/// ```rust
/// use dvkit::export::{ExportFormat, write_store};
/// use dvkit::{Event, EventStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = EventStore::new();
/// store.append(Event::new(1, 2, 3, true))?;
///
/// let mut out = Vec::new();
/// write_store(&store, ExportFormat::Csv, &mut out)?;
/// assert_eq!(String::from_utf8(out)?, "timestamp,x,y,polarity\n1,2,3,1\n");
/// # Ok(())
/// # }
/// ```
pub fn write_store<T, W>(store: &Store<T>, format: ExportFormat, out: &mut W) -> Result<usize>
where
    T: Timestamped + Clone + Serialize + CsvRecord,
    W: Write,
{
    match format {
        ExportFormat::Csv => write_csv(store, out).map_err(ExportError::from)?,
        ExportFormat::JsonLines => write_json_lines(store, out)?,
    }
    out.flush().map_err(ExportError::from)?;
    Ok(store.len())
}

fn write_csv<T, W>(store: &Store<T>, out: &mut W) -> std::io::Result<()>
where
    T: Timestamped + Clone + CsvRecord,
    W: Write,
{
    writeln!(out, "{}", T::HEADER)?;
    for element in store {
        element.write_row(out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_json_lines<T, W>(store: &Store<T>, out: &mut W) -> std::result::Result<(), ExportError>
where
    T: Timestamped + Clone + Serialize,
    W: Write,
{
    for element in store {
        serde_json::to_writer(&mut *out, element)?;
        writeln!(out)?;
    }
    Ok(())
}
