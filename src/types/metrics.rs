//! Control-quality types: StepDirection, StepMetrics, AggregateSummary

use serde::{Deserialize, Serialize};

// ============================================================================
// Stage 2: Per-Step Metrics
// ============================================================================

/// Direction of the commanded temperature change for one step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StepDirection {
    Heating,
    Cooling,
}

impl StepDirection {
    /// Classify a step by its name.
    ///
    /// A step is cooling when its name contains "Cool" or is exactly "Cooling".
    /// The exact-match arm is subsumed by the substring arm. Matching is case
    /// sensitive, so "cooling" is a heating step.
    pub fn from_step_name(name: &str) -> Self {
        if name.contains("Cool") || name == "Cooling" {
            Self::Cooling
        } else {
            Self::Heating
        }
    }
}

impl std::fmt::Display for StepDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDirection::Heating => write!(f, "heating"),
            StepDirection::Cooling => write!(f, "cooling"),
        }
    }
}

/// Control-quality metrics for one step run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepMetrics {
    /// Step identifier
    pub step_name: String,
    /// Heating or cooling, derived from the step name
    pub direction: StepDirection,
    /// Commanded temperature, taken from the first running sample (°C)
    pub target: f64,
    /// Last sample time minus first sample time (s)
    pub duration: f64,
    /// Mean of `target - current_temp` (°C)
    pub mean_error: f64,
    /// Largest absolute tracking error (°C)
    pub max_error: f64,
    /// Mean error over the tail of the run (°C)
    pub ss_error: f64,
    /// Peak excursion above target, heating steps only (°C)
    pub overshoot: f64,
    /// Time to cover 90% of the commanded change, 0 if never reached (s)
    pub rise_time: f64,
    /// Error sign flips divided by two
    pub oscillations: f64,
    /// Number of running samples in the run
    pub sample_count: usize,
}

// ============================================================================
// Stage 3: Aggregate Summary
// ============================================================================

/// Metrics reduced across every analysed step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateSummary {
    /// Mean overshoot across steps (°C)
    pub avg_overshoot: f64,
    /// Mean oscillation count across steps
    pub avg_oscillations: f64,
    /// Largest absolute steady-state error of any step (°C)
    pub max_ss_error: f64,
    /// Steps whose rise time exceeded the slow-rise fraction of their duration
    pub slow_step_count: usize,
    /// Number of steps summarised
    pub total_steps: usize,
}
