//! Config validation: unknown-key detection with Levenshtein suggestions
//! and plausibility range checks.
//!
//! Two-pass parse: the raw TOML is first read into `toml::Value` and its key
//! tree compared against the known field names, emitting "did you mean?"
//! warnings. Normal serde deserialization follows. Warnings never break a
//! config that parses.

use std::collections::HashSet;

use super::TuningConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `TuningConfig`.
///
/// Maintained by hand against the struct hierarchy in tuning_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [gains]
        "gains",
        "gains.kp",
        "gains.ki",
        "gains.kd",
        // [thresholds]
        "thresholds",
        "thresholds.steady_state_error_high",
        "thresholds.overshoot_excessive",
        "thresholds.overshoot_moderate",
        "thresholds.oscillations_high",
        "thresholds.slow_rise_fraction",
        "thresholds.slow_step_majority",
        // [adjustments]
        "adjustments",
        "adjustments.steady_state_ki",
        "adjustments.excessive_overshoot_kp",
        "adjustments.moderate_overshoot_kd",
        "adjustments.oscillation_kp",
        "adjustments.oscillation_ki",
        "adjustments.slow_response_kp",
        // [fine_tuning]
        "fine_tuning",
        "fine_tuning.faster_response_kp",
        "fine_tuning.less_overshoot_kp",
        // [analysis]
        "analysis",
        "analysis.steady_state_window",
        "analysis.rise_fraction",
        "analysis.step_order",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Levenshtein edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smaller key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails: malformed TOML yields no warnings and is reported by the
/// serde pass instead.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            ValidationWarning {
                field: key,
                message,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Plausibility Range Validation
// ============================================================================

/// Upper bound for a gain before it is flagged as suspicious
const GAIN_SUSPICIOUS_ABOVE: f64 = 100.0;
/// Upper bound for a temperature threshold before it is flagged (°C)
const TEMPERATURE_THRESHOLD_SUSPICIOUS_ABOVE: f64 = 100.0;
/// Rise fractions below this no longer describe a rise
const RISE_FRACTION_SUSPICIOUS_BELOW: f64 = 0.5;

/// Plausibility checks on a parsed `TuningConfig`.
///
/// Returns (errors, warnings). Errors are configurations the analysis cannot
/// act on; warnings are legal but unusual values.
pub fn validate_tuning_ranges(config: &TuningConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let g = &config.gains;
    if g.kp == 0.0 && g.ki == 0.0 && g.kd == 0.0 {
        errors.push("gains.kp, gains.ki and gains.kd are all zero; the controller has no output".to_string());
    }

    let gains = [
        ("gains.kp", g.kp),
        ("gains.ki", g.ki),
        ("gains.kd", g.kd),
        ("adjustments.steady_state_ki", config.adjustments.steady_state_ki),
        ("adjustments.excessive_overshoot_kp", config.adjustments.excessive_overshoot_kp),
        ("adjustments.moderate_overshoot_kd", config.adjustments.moderate_overshoot_kd),
        ("adjustments.oscillation_kp", config.adjustments.oscillation_kp),
        ("adjustments.oscillation_ki", config.adjustments.oscillation_ki),
        ("adjustments.slow_response_kp", config.adjustments.slow_response_kp),
    ];
    for (field, value) in gains {
        if value > GAIN_SUSPICIOUS_ABOVE {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {value:.2} is unusually large for a reflow oven loop"),
                suggestion: None,
            });
        }
    }

    let t = &config.thresholds;
    for (field, value) in [
        ("thresholds.steady_state_error_high", t.steady_state_error_high),
        ("thresholds.overshoot_excessive", t.overshoot_excessive),
        ("thresholds.overshoot_moderate", t.overshoot_moderate),
    ] {
        if value > TEMPERATURE_THRESHOLD_SUSPICIOUS_ABOVE {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {value:.1} °C will never realistically fire"),
                suggestion: None,
            });
        }
    }

    let rise = config.analysis.rise_fraction;
    if rise > 0.0 && rise < RISE_FRACTION_SUSPICIOUS_BELOW {
        warnings.push(ValidationWarning {
            field: "analysis.rise_fraction".to_string(),
            message: format!("analysis.rise_fraction = {rise:.2} measures less than half the commanded change"),
            suggestion: None,
        });
    }

    // A rule whose proposed value equals the base gain changes nothing
    let a = &config.adjustments;
    for (field, proposed, base) in [
        ("adjustments.steady_state_ki", a.steady_state_ki, g.ki),
        ("adjustments.excessive_overshoot_kp", a.excessive_overshoot_kp, g.kp),
        ("adjustments.slow_response_kp", a.slow_response_kp, g.kp),
    ] {
        if (proposed - base).abs() < f64::EPSILON {
            warnings.push(ValidationWarning {
                field: field.to_string(),
                message: format!("{field} = {proposed:.2} equals the base gain; the rule proposes no change"),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
