//! Recommendation Engine
//!
//! An ordered list of independent rules, each evaluated against the same
//! immutable `AggregateSummary`. A rule that fires yields a `Recommendation`
//! carrying the gain overrides it proposes. The overrides of all fired rules
//! are then applied, in rule order, to a fresh plan seeded from the base
//! gains, so a later rule wins on a gain an earlier rule also set.
//!
//! | # | Trigger                         | Priority | Override        |
//! |---|---------------------------------|----------|-----------------|
//! | 1 | max_ss_error > 5                | HIGH     | Ki = 0.75       |
//! | 2 | avg_overshoot > 10              | HIGH     | Kp = 2.4        |
//! |   | else avg_overshoot > 5          | MEDIUM   | Kd = 0.3        |
//! | 3 | avg_oscillations > 3            | HIGH     | Kp = 2.1, Ki = 0.4 |
//! | 4 | slow steps > half of all steps  | MEDIUM   | Kp = 3.9        |
//!
//! Thresholds and override values come from `TuningConfig`; the table shows
//! the defaults.

use tracing::info;

use crate::config::TuningConfig;
use crate::types::{
    AggregateSummary, FineTuningOptions, Gain, GainAdjustmentPlan, GainOverride, GainSet,
    Priority, Recommendation, TuningAdvice, TuningIssue,
};

type Rule = fn(&AggregateSummary, &TuningConfig) -> Option<Recommendation>;

/// Rules in precedence order
const RULES: [Rule; 4] = [
    steady_state_rule,
    overshoot_rule,
    oscillation_rule,
    slow_response_rule,
];

pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Evaluate every rule against `summary` and build the gain plan
    pub fn evaluate(summary: &AggregateSummary, config: &TuningConfig) -> TuningAdvice {
        let base = config.base_gains();

        let recommendations: Vec<Recommendation> = RULES
            .iter()
            .filter_map(|rule| rule(summary, config))
            .collect();

        for rec in &recommendations {
            info!(priority = %rec.priority, issue = %rec.issue, action = %rec.action, "Tuning rule fired");
        }

        let plan = Self::apply(base, &recommendations);

        let fine_tuning = recommendations.is_empty().then(|| FineTuningOptions {
            faster_response_kp: config.fine_tuning.faster_response_kp,
            less_overshoot_kp: config.fine_tuning.less_overshoot_kp,
        });

        TuningAdvice {
            recommendations,
            plan,
            fine_tuning,
        }
    }

    /// Apply the overrides of `recommendations` in order to a plan seeded from `base`
    pub fn apply(base: GainSet, recommendations: &[Recommendation]) -> GainAdjustmentPlan {
        let proposed = recommendations
            .iter()
            .flat_map(|r| r.overrides.iter())
            .fold(base, |gains, o| gains.with(o.gain, o.value));

        GainAdjustmentPlan {
            base,
            new_kp: proposed.kp,
            new_ki: proposed.ki,
            new_kd: proposed.kd,
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

fn steady_state_rule(s: &AggregateSummary, c: &TuningConfig) -> Option<Recommendation> {
    if s.max_ss_error <= c.thresholds.steady_state_error_high {
        return None;
    }
    let ki = c.adjustments.steady_state_ki;
    Some(Recommendation {
        priority: Priority::High,
        issue: TuningIssue::HighSteadyStateError,
        action: change_text(Gain::Ki, c.gains.ki, ki),
        overrides: vec![GainOverride { gain: Gain::Ki, value: ki }],
    })
}

/// Excessive and moderate overshoot are exclusive; at most one fires
fn overshoot_rule(s: &AggregateSummary, c: &TuningConfig) -> Option<Recommendation> {
    let t = &c.thresholds;
    if s.avg_overshoot > t.overshoot_excessive {
        let kp = c.adjustments.excessive_overshoot_kp;
        Some(Recommendation {
            priority: Priority::High,
            issue: TuningIssue::ExcessiveOvershoot,
            action: change_text(Gain::Kp, c.gains.kp, kp),
            overrides: vec![GainOverride { gain: Gain::Kp, value: kp }],
        })
    } else if s.avg_overshoot > t.overshoot_moderate {
        let kd = c.adjustments.moderate_overshoot_kd;
        let action = if c.gains.kd == 0.0 {
            format!("Add derivative term: Kd = {}", fmt_gain(kd))
        } else {
            change_text(Gain::Kd, c.gains.kd, kd)
        };
        Some(Recommendation {
            priority: Priority::Medium,
            issue: TuningIssue::ModerateOvershoot,
            action,
            overrides: vec![GainOverride { gain: Gain::Kd, value: kd }],
        })
    } else {
        None
    }
}

fn oscillation_rule(s: &AggregateSummary, c: &TuningConfig) -> Option<Recommendation> {
    if s.avg_oscillations <= c.thresholds.oscillations_high {
        return None;
    }
    let kp = c.adjustments.oscillation_kp;
    let ki = c.adjustments.oscillation_ki;
    let verb = if kp <= c.gains.kp && ki <= c.gains.ki {
        "Reduce"
    } else {
        "Set"
    };
    Some(Recommendation {
        priority: Priority::High,
        issue: TuningIssue::Oscillating,
        action: format!("{verb} Kp to {} and Ki to {}", fmt_gain(kp), fmt_gain(ki)),
        overrides: vec![
            GainOverride { gain: Gain::Kp, value: kp },
            GainOverride { gain: Gain::Ki, value: ki },
        ],
    })
}

fn slow_response_rule(s: &AggregateSummary, c: &TuningConfig) -> Option<Recommendation> {
    let majority = s.total_steps as f64 * c.thresholds.slow_step_majority;
    if s.slow_step_count as f64 <= majority {
        return None;
    }
    let kp = c.adjustments.slow_response_kp;
    Some(Recommendation {
        priority: Priority::Medium,
        issue: TuningIssue::SlowResponse,
        action: change_text(Gain::Kp, c.gains.kp, kp),
        overrides: vec![GainOverride { gain: Gain::Kp, value: kp }],
    })
}

// ============================================================================
// Action Text
// ============================================================================

/// Gains print with at least one decimal place: 3.0, 0.5, 0.75
pub(crate) fn fmt_gain(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn change_text(gain: Gain, from: f64, to: f64) -> String {
    let verb = if to > from {
        "Increase"
    } else if to < from {
        "Decrease"
    } else {
        "Keep"
    };
    format!("{verb} {gain} from {} to {}", fmt_gain(from), fmt_gain(to))
}
