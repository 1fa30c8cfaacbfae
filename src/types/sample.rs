//! Telemetry sample types: RunStatus, TelemetrySample

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage 1: Telemetry Ingestion
// ============================================================================

/// Run state reported by the controller alongside every sample
///
/// The controller serialises its status enum by variant name; payload-carrying
/// variants (`Initializing(percent)`, `Error(message)`) are reduced to their tag
/// when the capture is flattened. Labels outside the known set are kept verbatim
/// so that a log from a newer firmware still loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RunStatus {
    Initializing,
    #[default]
    Idle,
    Running,
    Done,
    Error,
    Other(String),
}

impl RunStatus {
    /// Parse a status label as it appears in the tabular log
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Running" => Self::Running,
            "Idle" => Self::Idle,
            "Done" | "Complete" | "Completed" => Self::Done,
            l if l.starts_with("Initializing") => Self::Initializing,
            l if l.starts_with("Error") => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only samples taken while the profile is executing are analysed
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Initializing => write!(f, "Initializing"),
            RunStatus::Idle => write!(f, "Idle"),
            RunStatus::Running => write!(f, "Running"),
            RunStatus::Done => write!(f, "Done"),
            RunStatus::Error => write!(f, "Error"),
            RunStatus::Other(label) => write!(f, "{label}"),
        }
    }
}

/// One controller sample from a captured run log
///
/// Constructed once by the telemetry loader and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    /// Seconds since the controller booted (`time_ms / 1000`)
    pub time_s: f64,
    /// Controller run state
    pub status: RunStatus,
    /// Commanded temperature (°C)
    pub target_temp: f64,
    /// Measured temperature (°C)
    pub current_temp: f64,
    /// Heater duty cycle (0-100 %)
    pub heater_power: u8,
    /// Profile step identifier
    pub step: String,
    /// Door switch state
    pub door_closed: bool,
    /// Cooling fan state
    pub fan: bool,
}

impl TelemetrySample {
    /// Tracking error for this sample against an explicit target
    pub fn error_against(&self, target: f64) -> f64 {
        target - self.current_temp
    }
}

/// Outcome of flattening a captured message stream into a tabular log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CaptureSummary {
    /// Rows written after the header
    pub records_written: usize,
    /// Lines that could not be decoded as controller messages
    pub lines_skipped: usize,
}
