//! Tuning output types: Priority, TuningIssue, Recommendation, gains,
//! TuningAdvice, TuningReport

use serde::{Deserialize, Serialize};

use super::{AggregateSummary, StepMetrics};

// ============================================================================
// Stage 4: Recommendations
// ============================================================================

/// Urgency of a tuning recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
        }
    }
}

/// Loop deficiency detected by a rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TuningIssue {
    HighSteadyStateError,
    ExcessiveOvershoot,
    ModerateOvershoot,
    Oscillating,
    SlowResponse,
}

impl TuningIssue {
    /// Short machine-friendly tag
    pub fn tag(&self) -> &'static str {
        match self {
            TuningIssue::HighSteadyStateError => "high steady-state error",
            TuningIssue::ExcessiveOvershoot => "excessive overshoot",
            TuningIssue::ModerateOvershoot => "moderate overshoot",
            TuningIssue::Oscillating => "oscillating",
            TuningIssue::SlowResponse => "slow response",
        }
    }

    /// Headline shown in the report
    pub fn headline(&self) -> &'static str {
        match self {
            TuningIssue::HighSteadyStateError => "High steady-state error",
            TuningIssue::ExcessiveOvershoot => "Excessive overshoot",
            TuningIssue::ModerateOvershoot => "Moderate overshoot detected",
            TuningIssue::Oscillating => "System oscillating",
            TuningIssue::SlowResponse => "Slow response time",
        }
    }
}

impl std::fmt::Display for TuningIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Controller gain identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gain {
    Kp,
    Ki,
    Kd,
}

impl std::fmt::Display for Gain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gain::Kp => write!(f, "Kp"),
            Gain::Ki => write!(f, "Ki"),
            Gain::Kd => write!(f, "Kd"),
        }
    }
}

/// A full set of PID gains
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GainSet {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
}

impl GainSet {
    pub fn get(&self, gain: Gain) -> f64 {
        match gain {
            Gain::Kp => self.kp,
            Gain::Ki => self.ki,
            Gain::Kd => self.kd,
        }
    }

    /// Copy of this set with one gain replaced
    pub fn with(self, gain: Gain, value: f64) -> Self {
        match gain {
            Gain::Kp => Self { kp: value, ..self },
            Gain::Ki => Self { ki: value, ..self },
            Gain::Kd => Self { kd: value, ..self },
        }
    }
}

impl std::fmt::Display for GainSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Kp={:.2} Ki={:.2} Kd={:.2}", self.kp, self.ki, self.kd)
    }
}

/// One gain value proposed by a fired rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GainOverride {
    /// Gain the rule replaces
    pub gain: Gain,
    /// Proposed value for that gain
    pub value: f64,
}

/// A fired rule's output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub issue: TuningIssue,
    /// Human-readable corrective action
    pub action: String,
    /// Gains this recommendation proposes, in application order
    pub overrides: Vec<GainOverride>,
}

/// Gains after applying every fired override in rule order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GainAdjustmentPlan {
    /// Gains the analysed run was captured with
    pub base: GainSet,
    pub new_kp: f64,
    pub new_ki: f64,
    pub new_kd: f64,
}

impl GainAdjustmentPlan {
    /// Plan that keeps the base gains
    pub fn unchanged(base: GainSet) -> Self {
        Self {
            base,
            new_kp: base.kp,
            new_ki: base.ki,
            new_kd: base.kd,
        }
    }

    pub fn proposed(&self) -> GainSet {
        GainSet {
            kp: self.new_kp,
            ki: self.new_ki,
            kd: self.new_kd,
        }
    }

    /// Whether any gain differs from the base set
    pub fn is_changed(&self) -> bool {
        self.proposed() != self.base
    }
}

/// Optional Kp alternatives offered when the loop needs no correction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FineTuningOptions {
    pub faster_response_kp: f64,
    pub less_overshoot_kp: f64,
}

/// Rule engine output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningAdvice {
    /// Fired recommendations in rule order
    pub recommendations: Vec<Recommendation>,
    pub plan: GainAdjustmentPlan,
    /// Present only when no rule fired
    pub fine_tuning: Option<FineTuningOptions>,
}

impl TuningAdvice {
    pub fn is_performing_well(&self) -> bool {
        self.recommendations.is_empty()
    }
}

// ============================================================================
// Stage 5: Report
// ============================================================================

/// Shape of the loaded capture, independent of the analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DataSummary {
    pub sample_count: usize,
    pub first_time_s: f64,
    pub last_time_s: f64,
}

impl DataSummary {
    /// The controller clock starts at boot, so the last timestamp is the runtime
    pub fn total_runtime_s(&self) -> f64 {
        self.last_time_s
    }
}

/// Complete structured result of one analysis batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningReport {
    pub data: DataSummary,
    pub steps: Vec<StepMetrics>,
    pub summary: AggregateSummary,
    pub advice: TuningAdvice,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: GainSet = GainSet { kp: 3.0, ki: 0.5, kd: 0.0 };

    #[test]
    fn test_gain_set_with_replaces_one_gain() {
        let g = BASE.with(Gain::Ki, 0.75);
        assert_eq!(g.kp, 3.0);
        assert_eq!(g.ki, 0.75);
        assert_eq!(g.kd, 0.0);
        assert_eq!(g.get(Gain::Ki), 0.75);
    }

    #[test]
    fn test_unchanged_plan() {
        let plan = GainAdjustmentPlan::unchanged(BASE);
        assert!(!plan.is_changed());
        assert_eq!(plan.proposed(), BASE);
    }

    #[test]
    fn test_priority_serializes_uppercase() {
        let json = serde_json::to_string(&Priority::High).expect("serialize");
        assert_eq!(json, "\"HIGH\"");
    }
}
