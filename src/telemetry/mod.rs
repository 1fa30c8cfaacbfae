//! Telemetry Loader
//!
//! Parses a captured reflow run log (CSV) into an ordered, immutable sequence
//! of `TelemetrySample`s. The header is matched by column name, so extra
//! columns (`profile`, `timer`, anything a newer logger adds) are tolerated
//! and column order is free.
//!
//! Parsing is all-or-nothing: the first row with an unparseable required
//! field aborts the load with `LoadError::MalformedRecord`. Blank lines are
//! the only rows skipped.
//!
//! # Usage
//!
//! ```ignore
//! use reflow_tune::telemetry::TelemetryLog;
//!
//! let log = TelemetryLog::load("reflow_data.csv")?;
//! for sample in log.samples() {
//!     // Feed into the step segmenter
//! }
//! ```

pub mod capture;

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::types::{DataSummary, RunStatus, TelemetrySample};

// ============================================================================
// Column Names
// ============================================================================

pub const COL_TIME_MS: &str = "time_ms";
pub const COL_STATUS: &str = "status";
pub const COL_TARGET_TEMP: &str = "target_temp";
pub const COL_CURRENT_TEMP: &str = "current_temp";
pub const COL_HEATER_POWER: &str = "heater_power";
pub const COL_STEP: &str = "step";
pub const COL_PROFILE: &str = "profile";
pub const COL_DOOR_CLOSED: &str = "door_closed";
pub const COL_FAN: &str = "fan";
pub const COL_TIMER: &str = "timer";

/// Header written by the capture flattener, in column order
pub const LOG_HEADER: [&str; 10] = [
    COL_TIME_MS,
    COL_STATUS,
    COL_TARGET_TEMP,
    COL_CURRENT_TEMP,
    COL_HEATER_POWER,
    COL_STEP,
    COL_PROFILE,
    COL_DOOR_CLOSED,
    COL_FAN,
    COL_TIMER,
];

/// Largest valid heater duty cycle (%)
const HEATER_POWER_MAX: u8 = 100;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input has no header row: {}", .0.display())]
    EmptyInput(PathBuf),

    #[error("Required column '{column}' missing from header")]
    MissingColumn { column: &'static str },

    #[error("Malformed record at line {line}: {field} = '{value}' ({reason})")]
    MalformedRecord {
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
pub(crate) fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Indices of the required columns within a row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    time_ms: usize,
    status: usize,
    target_temp: usize,
    current_temp: usize,
    heater_power: usize,
    step: usize,
    door_closed: usize,
    fan: usize,
}

impl ColumnMap {
    /// Build the column map from a header line; every required column must exist
    fn from_header(header: &str) -> Result<Self, LoadError> {
        let columns: Vec<String> = csv_split(header)
            .into_iter()
            .map(|c| c.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let find = |column: &'static str| {
            columns
                .iter()
                .position(|c| c == column)
                .ok_or(LoadError::MissingColumn { column })
        };

        let map = Self {
            time_ms: find(COL_TIME_MS)?,
            status: find(COL_STATUS)?,
            target_temp: find(COL_TARGET_TEMP)?,
            current_temp: find(COL_CURRENT_TEMP)?,
            heater_power: find(COL_HEATER_POWER)?,
            step: find(COL_STEP)?,
            door_closed: find(COL_DOOR_CLOSED)?,
            fan: find(COL_FAN)?,
        };

        let extra: Vec<&str> = columns
            .iter()
            .map(String::as_str)
            .filter(|c| !LOG_HEADER.contains(c))
            .collect();
        if !extra.is_empty() {
            debug!(columns = ?extra, "Ignoring unrecognised columns");
        }

        Ok(map)
    }
}

// ============================================================================
// Row Parsing
// ============================================================================

fn field<'a>(fields: &'a [String], idx: usize, name: &'static str, line: usize) -> Result<&'a str, LoadError> {
    fields
        .get(idx)
        .map(|s| s.trim())
        .ok_or_else(|| LoadError::MalformedRecord {
            line,
            field: name,
            value: String::new(),
            reason: format!("row has {} fields", fields.len()),
        })
}

fn parse_f64(fields: &[String], idx: usize, name: &'static str, line: usize) -> Result<f64, LoadError> {
    let raw = field(fields, idx, name, line)?;
    let malformed = |reason: String| LoadError::MalformedRecord {
        line,
        field: name,
        value: raw.to_string(),
        reason,
    };
    let value: f64 = raw.parse().map_err(|e| malformed(format!("{e}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed("not a finite number".to_string()))
    }
}

fn parse_heater_power(fields: &[String], idx: usize, line: usize) -> Result<u8, LoadError> {
    let raw = field(fields, idx, COL_HEATER_POWER, line)?;
    let malformed = |reason: String| LoadError::MalformedRecord {
        line,
        field: COL_HEATER_POWER,
        value: raw.to_string(),
        reason,
    };
    let power: u8 = raw.parse().map_err(|e| malformed(format!("{e}")))?;
    if power > HEATER_POWER_MAX {
        return Err(malformed(format!("exceeds {HEATER_POWER_MAX}%")));
    }
    Ok(power)
}

fn parse_bool(fields: &[String], idx: usize, name: &'static str, line: usize) -> Result<bool, LoadError> {
    let raw = field(fields, idx, name, line)?;
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(LoadError::MalformedRecord {
            line,
            field: name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        })
    }
}

fn parse_row(line: &str, map: &ColumnMap, line_num: usize) -> Result<TelemetrySample, LoadError> {
    let fields = csv_split(line);

    let time_ms = parse_f64(&fields, map.time_ms, COL_TIME_MS, line_num)?;

    Ok(TelemetrySample {
        time_s: time_ms / 1000.0,
        status: RunStatus::from_label(field(&fields, map.status, COL_STATUS, line_num)?),
        target_temp: parse_f64(&fields, map.target_temp, COL_TARGET_TEMP, line_num)?,
        current_temp: parse_f64(&fields, map.current_temp, COL_CURRENT_TEMP, line_num)?,
        heater_power: parse_heater_power(&fields, map.heater_power, line_num)?,
        step: field(&fields, map.step, COL_STEP, line_num)?.to_string(),
        door_closed: parse_bool(&fields, map.door_closed, COL_DOOR_CLOSED, line_num)?,
        fan: parse_bool(&fields, map.fan, COL_FAN, line_num)?,
    })
}

// ============================================================================
// Telemetry Log
// ============================================================================

/// A fully loaded run log
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryLog {
    samples: Vec<TelemetrySample>,
    /// File the log was read from, if any
    pub source: Option<PathBuf>,
}

impl TelemetryLog {
    /// Load a run log from a CSV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::InputNotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let mut log = Self::parse_named(BufReader::new(file), path)?;
        log.source = Some(path.to_path_buf());

        info!(
            file = %path.display(),
            samples = log.samples.len(),
            "Run log loaded"
        );

        Ok(log)
    }

    /// Parse a run log from any buffered reader
    pub fn parse(reader: impl BufRead) -> Result<Self, LoadError> {
        Self::parse_named(reader, Path::new("<input>"))
    }

    fn parse_named(reader: impl BufRead, name: &Path) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: name.to_path_buf(),
            source,
        };

        let mut lines = reader.lines();
        // Physical 1-based line number of the last line read
        let mut line_num = 0usize;

        let header = loop {
            let Some(line) = lines.next() else {
                return Err(LoadError::EmptyInput(name.to_path_buf()));
            };
            line_num += 1;
            let line = line.map_err(io_err)?;
            if !line.trim().is_empty() {
                break line;
            }
        };
        let col_map = ColumnMap::from_header(&header)?;

        let mut samples: Vec<TelemetrySample> = Vec::new();
        let mut blank = 0usize;

        for line_result in lines {
            line_num += 1;
            let line = line_result.map_err(io_err)?;

            if line.trim().is_empty() {
                blank += 1;
                continue;
            }

            let sample = parse_row(&line, &col_map, line_num)?;
            // Rows must be time-ordered; equal timestamps are allowed
            if let Some(prev) = samples.last().map(|p| p.time_s) {
                if sample.time_s < prev {
                    return Err(LoadError::MalformedRecord {
                        line: line_num,
                        field: COL_TIME_MS,
                        value: format!("{}", sample.time_s * 1000.0),
                        reason: format!("timestamp out of order (previous row at {prev}s)"),
                    });
                }
            }
            samples.push(sample);
        }

        debug!(samples = samples.len(), blank_lines = blank, "Parsed run log rows");

        Ok(Self { samples, source: None })
    }

    /// Build a log directly from samples
    pub fn from_samples(samples: Vec<TelemetrySample>) -> Self {
        Self { samples, source: None }
    }

    /// All samples in file order
    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample count and time range of the whole log
    pub fn data_summary(&self) -> DataSummary {
        DataSummary {
            sample_count: self.samples.len(),
            first_time_s: self.samples.first().map_or(0.0, |s| s.time_s),
            last_time_s: self.samples.last().map_or(0.0, |s| s.time_s),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
