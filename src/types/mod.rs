//! Shared data structures for reflow loop diagnostics
//!
//! This module defines the core types for the tuning pipeline:
//! - Stage 1: TelemetrySample (one parsed row of a captured run log)
//! - Stage 2: StepMetrics (control-quality metrics for one step run)
//! - Stage 3: AggregateSummary (metrics reduced across all runs)
//! - Stage 4: Recommendation, GainAdjustmentPlan, TuningAdvice (rule engine output)
//! - Stage 5: TuningReport (everything the renderer needs)

mod sample;
mod metrics;
mod tuning;

pub use sample::*;
pub use metrics::*;
pub use tuning::*;
