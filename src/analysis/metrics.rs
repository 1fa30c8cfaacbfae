//! Per-step control-quality metrics
//!
//! A pure function of one `StepRun`. The commanded temperature is taken from
//! the run's first sample and the tracking error of every sample is measured
//! against it:
//!
//! - `mean_error`: mean of `target - current_temp`
//! - `max_error`: largest absolute error
//! - `ss_error`: mean error over the last `steady_state_window` samples
//! - `overshoot`: peak excursion above target, heating steps only
//! - `rise_time`: time to cover `rise_fraction` of the commanded change
//! - `oscillations`: error sign changes divided by two

use statrs::statistics::Statistics;

use super::segmenter::StepRun;
use crate::config::AnalysisConfig;
use crate::types::{StepDirection, StepMetrics, TelemetrySample};

/// Computes `StepMetrics` for a single run
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute metrics for `run`. Returns `None` only for an empty run.
    pub fn compute(run: &StepRun<'_>, params: &AnalysisConfig) -> Option<StepMetrics> {
        let first = run.first()?;
        let last = run.last()?;

        let target = first.target_temp;
        let direction = StepDirection::from_step_name(run.step_name);
        let errors: Vec<f64> = run.samples.iter().map(|s| s.error_against(target)).collect();

        Some(StepMetrics {
            step_name: run.step_name.to_string(),
            direction,
            target,
            duration: last.time_s - first.time_s,
            mean_error: errors.iter().mean(),
            max_error: errors.iter().abs_max(),
            ss_error: Self::steady_state_error(&errors, params.steady_state_window),
            overshoot: Self::overshoot(&run.samples, target, direction),
            rise_time: Self::rise_time(&run.samples, target, direction, params.rise_fraction),
            oscillations: Self::oscillations(&errors),
            sample_count: run.len(),
        })
    }

    /// Mean of the last `min(window, n)` errors
    pub fn steady_state_error(errors: &[f64], window: usize) -> f64 {
        let start = errors.len().saturating_sub(window);
        errors[start..].iter().mean()
    }

    /// Peak temperature above target; cooling steps never overshoot
    pub fn overshoot(samples: &[&TelemetrySample], target: f64, direction: StepDirection) -> f64 {
        match direction {
            StepDirection::Cooling => 0.0,
            StepDirection::Heating => {
                let peak = samples
                    .iter()
                    .map(|s| s.current_temp)
                    .fold(f64::NEG_INFINITY, f64::max);
                (peak - target).max(0.0)
            }
        }
    }

    /// Elapsed time from the run's first sample to the first sample past the
    /// rise threshold, or 0 when the threshold is never reached
    pub fn rise_time(
        samples: &[&TelemetrySample],
        target: f64,
        direction: StepDirection,
        rise_fraction: f64,
    ) -> f64 {
        let Some(first) = samples.first() else {
            return 0.0;
        };
        let start_temp = first.current_temp;
        let threshold = start_temp + rise_fraction * (target - start_temp);

        let reached = |s: &&&TelemetrySample| match direction {
            StepDirection::Heating => s.current_temp >= threshold,
            StepDirection::Cooling => s.current_temp <= threshold,
        };

        samples
            .iter()
            .find(reached)
            .map_or(0.0, |s| s.time_s - first.time_s)
    }

    /// Half the number of adjacent pairs whose errors differ in sign.
    ///
    /// Zero counts as non-positive.
    pub fn oscillations(errors: &[f64]) -> f64 {
        let flips = errors
            .windows(2)
            .filter(|w| (w[0] > 0.0) != (w[1] > 0.0))
            .count();
        flips as f64 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunStatus;

    fn sample(t: f64, target: f64, current: f64) -> TelemetrySample {
        TelemetrySample {
            time_s: t,
            status: RunStatus::Running,
            target_temp: target,
            current_temp: current,
            heater_power: 50,
            step: String::new(),
            door_closed: true,
            fan: false,
        }
    }

    fn metrics(name: &str, samples: &[TelemetrySample]) -> StepMetrics {
        let run = StepRun {
            step_name: name,
            samples: samples.iter().collect(),
        };
        MetricsCalculator::compute(&run, &AnalysisConfig::default()).expect("non-empty run")
    }

    #[test]
    fn test_basic_errors() {
        let samples = vec![
            sample(10.0, 100.0, 90.0),
            sample(11.0, 100.0, 95.0),
            sample(12.0, 100.0, 103.0),
        ];
        let m = metrics("Reflow", &samples);
        assert_eq!(m.target, 100.0);
        assert_eq!(m.duration, 2.0);
        assert!((m.mean_error - 4.0).abs() < 1e-9, "mean_error = {}", m.mean_error);
        assert!((m.max_error - 10.0).abs() < 1e-9);
        assert!((m.overshoot - 3.0).abs() < 1e-9);
        assert_eq!(m.sample_count, 3);
        assert_eq!(m.direction, StepDirection::Heating);
    }

    #[test]
    fn test_target_taken_from_first_sample() {
        let samples = vec![sample(0.0, 100.0, 100.0), sample(1.0, 200.0, 100.0)];
        let m = metrics("Soak", &samples);
        assert_eq!(m.target, 100.0);
        assert_eq!(m.mean_error, 0.0);
    }

    #[test]
    fn test_alternating_errors_oscillations() {
        for n in [2usize, 5, 10, 11] {
            let errors: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
            let expected = (n - 1) as f64 / 2.0;
            assert_eq!(MetricsCalculator::oscillations(&errors), expected, "n = {n}");
        }
    }

    #[test]
    fn test_zero_error_is_non_positive() {
        assert_eq!(MetricsCalculator::oscillations(&[0.0, -1.0, 0.0]), 0.0);
        assert_eq!(MetricsCalculator::oscillations(&[1.0, 0.0]), 0.5);
    }

    #[test]
    fn test_steady_state_window() {
        // 15 errors: first five 100, last ten 1
        let mut errors = vec![100.0; 5];
        errors.extend(vec![1.0; 10]);
        assert_eq!(MetricsCalculator::steady_state_error(&errors, 10), 1.0);

        // Fewer samples than the window uses all of them
        let short = [2.0, 4.0, 6.0];
        assert_eq!(MetricsCalculator::steady_state_error(&short, 10), 4.0);
    }

    #[test]
    fn test_rise_time_heating() {
        // 25 -> 125, threshold 115
        let samples = vec![
            sample(0.0, 125.0, 25.0),
            sample(5.0, 125.0, 80.0),
            sample(10.0, 125.0, 116.0),
            sample(15.0, 125.0, 124.0),
        ];
        let m = metrics("Ramp", &samples);
        assert_eq!(m.rise_time, 10.0);
    }

    #[test]
    fn test_rise_time_never_reached() {
        let samples = vec![
            sample(0.0, 200.0, 25.0),
            sample(5.0, 200.0, 100.0),
            sample(10.0, 200.0, 150.0),
        ];
        let m = metrics("Ramp", &samples);
        assert_eq!(m.rise_time, 0.0);
    }

    #[test]
    fn test_cooling_rise_time_never_reached() {
        // 220 -> 50, threshold 67, stalls at 100
        let samples = vec![
            sample(0.0, 50.0, 220.0),
            sample(10.0, 50.0, 150.0),
            sample(20.0, 50.0, 100.0),
            sample(30.0, 50.0, 100.0),
        ];
        let m = metrics("Cooling", &samples);
        assert_eq!(m.direction, StepDirection::Cooling);
        assert_eq!(m.rise_time, 0.0);
    }

    #[test]
    fn test_cooling_step() {
        // 220 -> 50, threshold 67
        let samples = vec![
            sample(100.0, 50.0, 220.0),
            sample(110.0, 50.0, 150.0),
            sample(120.0, 50.0, 60.0),
            sample(130.0, 50.0, 55.0),
        ];
        let m = metrics("Cooling", &samples);
        assert_eq!(m.direction, StepDirection::Cooling);
        assert_eq!(m.overshoot, 0.0);
        assert_eq!(m.rise_time, 20.0);
    }

    #[test]
    fn test_lowercase_cool_treated_as_heating() {
        let samples = vec![sample(0.0, 50.0, 220.0), sample(1.0, 50.0, 60.0)];
        let m = metrics("cooldown", &samples);
        assert_eq!(m.direction, StepDirection::Heating);
        assert_eq!(m.overshoot, 170.0);
    }

    #[test]
    fn test_single_sample_run() {
        let samples = vec![sample(3.0, 150.0, 140.0)];
        let m = metrics("Preheat", &samples);
        assert_eq!(m.duration, 0.0);
        assert_eq!(m.oscillations, 0.0);
        assert_eq!(m.ss_error, 10.0);
    }

    #[test]
    fn test_empty_run_has_no_metrics() {
        let run = StepRun {
            step_name: "Empty",
            samples: Vec::new(),
        };
        assert!(MetricsCalculator::compute(&run, &AnalysisConfig::default()).is_none());
    }
}
