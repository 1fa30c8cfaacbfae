//! reflow-tune: Reflow Oven PID Loop Diagnostics
//!
//! Analyses a captured reflow run log and recommends controller gain changes.
//!
//! ## Pipeline
//!
//! - **Telemetry**: run log parsing and capture flattening
//! - **Analysis**: step segmentation, per-step metrics, aggregation, tuning rules
//! - **Report**: text and JSON rendering
//!
//! ```ignore
//! let log = reflow_tune::TelemetryLog::load("reflow_data.csv")?;
//! let report = reflow_tune::run_analysis(&log, &reflow_tune::TuningConfig::load())?;
//! ```

pub mod analysis;
pub mod config;
pub mod report;
pub mod telemetry;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, StepOrder, TuningConfig};

// Re-export the pipeline entry points
pub use analysis::{run_analysis, AnalysisError};
pub use telemetry::{LoadError, TelemetryLog};

// Re-export commonly used types
pub use types::{
    AggregateSummary, DataSummary, GainAdjustmentPlan, GainSet, Priority, Recommendation,
    RunStatus, StepDirection, StepMetrics, TelemetrySample, TuningAdvice, TuningIssue,
    TuningReport,
};
