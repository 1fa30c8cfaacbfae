//! Aggregate analysis: reduce per-step metrics into one summary

use statrs::statistics::Statistics;

use super::AnalysisError;
use crate::config::RuleThresholds;
use crate::types::{AggregateSummary, StepMetrics};

pub struct AggregateAnalyzer;

impl AggregateAnalyzer {
    /// Summarise `steps`.
    ///
    /// Fails with `EmptyDataset` when there are no steps.
    pub fn summarize(
        steps: &[StepMetrics],
        thresholds: &RuleThresholds,
    ) -> Result<AggregateSummary, AnalysisError> {
        if steps.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let slow_step_count = steps
            .iter()
            .filter(|m| Self::is_slow(m, thresholds.slow_rise_fraction))
            .count();

        Ok(AggregateSummary {
            avg_overshoot: steps.iter().map(|m| m.overshoot).mean(),
            avg_oscillations: steps.iter().map(|m| m.oscillations).mean(),
            max_ss_error: steps.iter().map(|m| m.ss_error).abs_max(),
            slow_step_count,
            total_steps: steps.len(),
        })
    }

    /// A step is slow when its rise took longer than `fraction` of its duration
    pub fn is_slow(step: &StepMetrics, fraction: f64) -> bool {
        step.rise_time > fraction * step.duration
    }
}
