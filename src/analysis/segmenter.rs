//! Step Segmentation
//!
//! Groups samples by step identifier and keeps only the samples taken while
//! the profile was running. A step that never ran produces no `StepRun`.
//!
//! Runs are reported in lexicographic order of the step identifier unless
//! `StepOrder::FirstSeen` is requested, in which case they follow the
//! chronological order of each step's first sample.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::StepOrder;
use crate::types::TelemetrySample;

/// The running samples of one step, in log order
///
/// Never empty: the segmenter only emits runs with at least one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRun<'a> {
    pub step_name: &'a str,
    pub samples: Vec<&'a TelemetrySample>,
}

impl<'a> StepRun<'a> {
    pub fn first(&self) -> Option<&'a TelemetrySample> {
        self.samples.first().copied()
    }

    pub fn last(&self) -> Option<&'a TelemetrySample> {
        self.samples.last().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Splits a run log into per-step control runs
pub struct StepSegmenter;

impl StepSegmenter {
    /// Segment `samples` into one `StepRun` per step that has running samples.
    ///
    /// Grouping covers every sample regardless of status; the running filter
    /// is applied per group, so a step whose samples are all idle or done is
    /// dropped silently.
    pub fn segment(samples: &[TelemetrySample], order: StepOrder) -> Vec<StepRun<'_>> {
        let groups = match order {
            StepOrder::ByName => Self::group_by_name(samples),
            StepOrder::FirstSeen => Self::group_first_seen(samples),
        };

        groups
            .into_iter()
            .filter_map(|(step_name, group)| {
                let running: Vec<&TelemetrySample> =
                    group.into_iter().filter(|s| s.status.is_running()).collect();
                if running.is_empty() {
                    debug!(step = step_name, "Dropping step with no running samples");
                    None
                } else {
                    Some(StepRun {
                        step_name,
                        samples: running,
                    })
                }
            })
            .collect()
    }

    fn group_by_name(samples: &[TelemetrySample]) -> Vec<(&str, Vec<&TelemetrySample>)> {
        let mut groups: BTreeMap<&str, Vec<&TelemetrySample>> = BTreeMap::new();
        for sample in samples {
            groups.entry(sample.step.as_str()).or_default().push(sample);
        }
        groups.into_iter().collect()
    }

    fn group_first_seen(samples: &[TelemetrySample]) -> Vec<(&str, Vec<&TelemetrySample>)> {
        let mut groups: Vec<(&str, Vec<&TelemetrySample>)> = Vec::new();
        for sample in samples {
            match groups.iter_mut().find(|(name, _)| *name == sample.step) {
                Some((_, group)) => group.push(sample),
                None => groups.push((sample.step.as_str(), vec![sample])),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RunStatus;

    fn sample(t: f64, step: &str, status: RunStatus) -> TelemetrySample {
        TelemetrySample {
            time_s: t,
            status,
            target_temp: 150.0,
            current_temp: 100.0,
            heater_power: 50,
            step: step.to_string(),
            door_closed: true,
            fan: false,
        }
    }

    fn log() -> Vec<TelemetrySample> {
        vec![
            sample(0.0, "Preheat", RunStatus::Idle),
            sample(1.0, "Preheat", RunStatus::Running),
            sample(2.0, "Preheat", RunStatus::Running),
            sample(3.0, "Soak", RunStatus::Running),
            sample(4.0, "Reflow", RunStatus::Running),
            sample(5.0, "Cooling", RunStatus::Running),
            sample(6.0, "", RunStatus::Done),
        ]
    }

    #[test]
    fn test_runs_ordered_by_name() {
        let samples = log();
        let runs = StepSegmenter::segment(&samples, StepOrder::ByName);
        let names: Vec<&str> = runs.iter().map(|r| r.step_name).collect();
        assert_eq!(names, vec!["Cooling", "Preheat", "Reflow", "Soak"]);
    }

    #[test]
    fn test_runs_ordered_first_seen() {
        let samples = log();
        let runs = StepSegmenter::segment(&samples, StepOrder::FirstSeen);
        let names: Vec<&str> = runs.iter().map(|r| r.step_name).collect();
        assert_eq!(names, vec!["Preheat", "Soak", "Reflow", "Cooling"]);
    }

    #[test]
    fn test_non_running_samples_filtered() {
        let samples = log();
        let runs = StepSegmenter::segment(&samples, StepOrder::ByName);
        let preheat = runs
            .iter()
            .find(|r| r.step_name == "Preheat")
            .expect("preheat run");
        assert_eq!(preheat.len(), 2);
        assert_eq!(preheat.first().map(|s| s.time_s), Some(1.0));
        assert_eq!(preheat.last().map(|s| s.time_s), Some(2.0));
    }

    #[test]
    fn test_step_without_running_samples_dropped() {
        let samples = log();
        let runs = StepSegmenter::segment(&samples, StepOrder::ByName);
        assert!(runs.iter().all(|r| !r.step_name.is_empty()));
        assert!(runs.iter().all(|r| !r.is_empty()));
    }

    #[test]
    fn test_interleaved_step_revisited() {
        let samples = vec![
            sample(0.0, "B", RunStatus::Running),
            sample(1.0, "A", RunStatus::Running),
            sample(2.0, "B", RunStatus::Running),
        ];
        let runs = StepSegmenter::segment(&samples, StepOrder::FirstSeen);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].step_name, "B");
        let times: Vec<f64> = runs[0].samples.iter().map(|s| s.time_s).collect();
        assert_eq!(times, vec![0.0, 2.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(StepSegmenter::segment(&[], StepOrder::ByName).is_empty());
    }
}
