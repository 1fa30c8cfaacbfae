//! Capture flattener: controller message stream to tabular run log
//!
//! The controller emits one JSON message per line:
//!
//! ```text
//! {"time_ms": 1500, "state": {"status": "Running", "current_temperature": 81.2, ...}}
//! {"time_ms": 1600, "state": "{\"status\":{\"Initializing\":40}, ...}"}
//! ```
//!
//! `state` is either an object or a JSON-encoded string of one. Enum-valued
//! fields arrive in serde's externally tagged form and are reduced to their
//! tag. Missing fields fall back to zero, empty or false. Lines that do not
//! decode are counted and skipped, so console noise interleaved with the
//! stream does not abort a capture.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::LOG_HEADER;
use crate::types::CaptureSummary;

/// Skipped lines logged individually before going quiet
const MAX_LOGGED_SKIPS: usize = 10;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No controller messages found ({skipped} lines skipped)")]
    NoRecords { skipped: usize },
}

// ============================================================================
// Message Shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    time_ms: Option<Value>,
    #[serde(default)]
    state: Option<StateField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateField {
    Object(ControllerState),
    Encoded(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControllerState {
    status: Value,
    target_temperature: f64,
    current_temperature: f64,
    heater_power: Value,
    current_step: Value,
    current_profile: Value,
    door_closed: bool,
    fan: bool,
    timer: Value,
}

/// Render a loosely typed field as a single CSV cell.
///
/// Strings pass through, numbers keep their JSON spelling, and a tagged enum
/// such as `{"Error": "thermocouple open"}` becomes its tag.
fn label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => map.keys().next().cloned().unwrap_or_default(),
        Value::Array(_) => value.to_string(),
    }
}

fn number_or_zero(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

/// Quote a cell when it would otherwise split the row
fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Decode one captured line into a CSV row
fn flatten_line(line: &str) -> Result<String, serde_json::Error> {
    let message: Message = serde_json::from_str(line)?;

    let state = match message.state {
        None => ControllerState::default(),
        Some(StateField::Object(state)) => state,
        Some(StateField::Encoded(raw)) => serde_json::from_str(&raw)?,
    };

    let cells = [
        number_or_zero(message.time_ms.as_ref()),
        label(&state.status),
        format!("{:.2}", state.target_temperature),
        format!("{:.2}", state.current_temperature),
        number_or_zero(Some(&state.heater_power)),
        label(&state.current_step),
        label(&state.current_profile),
        state.door_closed.to_string(),
        state.fan.to_string(),
        number_or_zero(Some(&state.timer)),
    ];

    Ok(cells.iter().map(|c| csv_escape(c)).collect::<Vec<_>>().join(","))
}

// ============================================================================
// Entry Points
// ============================================================================

/// Flatten a message stream from `reader` into a run log on `writer`.
///
/// `name` labels I/O errors.
pub fn flatten(
    reader: impl BufRead,
    writer: impl Write,
    name: &Path,
) -> Result<CaptureSummary, CaptureError> {
    let io_err = |source| CaptureError::Io {
        path: name.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(writer);
    writeln!(writer, "{}", LOG_HEADER.join(",")).map_err(io_err)?;

    let mut summary = CaptureSummary::default();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(io_err)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match flatten_line(line) {
            Ok(row) => {
                writeln!(writer, "{row}").map_err(io_err)?;
                summary.records_written += 1;
            }
            Err(e) => {
                if summary.lines_skipped < MAX_LOGGED_SKIPS {
                    let preview: String = line.chars().take(100).collect();
                    warn!(line = idx + 1, error = %e, text = %preview, "Skipping undecodable capture line");
                }
                summary.lines_skipped += 1;
            }
        }
    }

    writer.flush().map_err(io_err)?;

    if summary.records_written == 0 {
        return Err(CaptureError::NoRecords {
            skipped: summary.lines_skipped,
        });
    }

    Ok(summary)
}

/// Flatten the capture at `from` into a CSV run log at `to`
pub fn flatten_file(from: &Path, to: &Path) -> Result<CaptureSummary, CaptureError> {
    let input = File::open(from).map_err(|source| CaptureError::Io {
        path: from.to_path_buf(),
        source,
    })?;
    let output = File::create(to).map_err(|source| CaptureError::Io {
        path: to.to_path_buf(),
        source,
    })?;

    let summary = flatten(BufReader::new(input), output, to)?;

    info!(
        from = %from.display(),
        to = %to.display(),
        records = summary.records_written,
        skipped = summary.lines_skipped,
        "Capture flattened"
    );

    Ok(summary)
}
