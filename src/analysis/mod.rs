//! Analysis Pipeline
//!
//! Turns a loaded run log into a `TuningReport`:
//!
//! ```text
//! TelemetryLog → StepSegmenter → MetricsCalculator (per run)
//!              → AggregateAnalyzer → RecommendationEngine → TuningReport
//! ```
//!
//! Every stage is a pure function of its input and the `TuningConfig`. A
//! failure in any stage aborts the whole batch; no partial report is produced.

pub mod aggregate;
pub mod metrics;
pub mod recommendation;
pub mod segmenter;

pub use aggregate::AggregateAnalyzer;
pub use metrics::MetricsCalculator;
pub use recommendation::RecommendationEngine;
pub use segmenter::{StepRun, StepSegmenter};

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::TuningConfig;
use crate::telemetry::{LoadError, TelemetryLog};
use crate::types::{StepMetrics, TuningReport};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No step contains running samples; nothing to analyse")]
    EmptyDataset,

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Run the full analysis over a loaded log
pub fn run_analysis(log: &TelemetryLog, config: &TuningConfig) -> Result<TuningReport, AnalysisError> {
    let runs = StepSegmenter::segment(log.samples(), config.analysis.step_order);
    if runs.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let steps: Vec<StepMetrics> = runs
        .iter()
        .filter_map(|run| MetricsCalculator::compute(run, &config.analysis))
        .collect();

    let summary = AggregateAnalyzer::summarize(&steps, &config.thresholds)?;
    let advice = RecommendationEngine::evaluate(&summary, config);

    info!(
        steps = summary.total_steps,
        issues = advice.recommendations.len(),
        "Analysis complete"
    );

    Ok(TuningReport {
        data: log.data_summary(),
        steps,
        summary,
        advice,
    })
}

/// Load the run log at `path` and analyse it
pub fn analyze_file(path: &Path, config: &TuningConfig) -> Result<TuningReport, AnalysisError> {
    let log = TelemetryLog::load(path)?;
    run_analysis(&log, config)
}
