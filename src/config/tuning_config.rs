//! Tuning Configuration - analysis constants as operator-tunable TOML values
//!
//! Each struct implements `Default` with values from `defaults.rs`, so an
//! absent or empty config file reproduces the stock analysis exactly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::types::GainSet;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one analysis run.
///
/// Load with `TuningConfig::load()` which searches:
/// 1. `$REFLOW_TUNE_CONFIG`
/// 2. `./reflow_tune.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Gains the analysed run was captured with
    #[serde(default)]
    pub gains: GainsConfig,

    /// Rule trigger thresholds
    #[serde(default)]
    pub thresholds: RuleThresholds,

    /// Gain values proposed by each rule
    #[serde(default)]
    pub adjustments: GainAdjustments,

    /// Alternatives offered when no rule fires
    #[serde(default)]
    pub fine_tuning: FineTuningConfig,

    /// Metric computation parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl TuningConfig {
    /// Load configuration using the standard search order:
    /// 1. `$REFLOW_TUNE_CONFIG` environment variable
    /// 2. `./reflow_tune.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded tuning config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./reflow_tune.toml
        let local = PathBuf::from(defaults::DEFAULT_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded tuning config from ./{}", defaults::DEFAULT_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::DEFAULT_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", defaults::DEFAULT_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings and never fail the parse.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Base gains as a `GainSet`.
    pub fn base_gains(&self) -> GainSet {
        GainSet {
            kp: self.gains.kp,
            ki: self.gains.ki,
            kd: self.gains.kd,
        }
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Every value must be finite
    /// - Gains must be non-negative
    /// - Excessive overshoot threshold must exceed the moderate one
    /// - Fractions must lie in (0, 1]
    /// - The steady-state window must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let g = &self.gains;
        for (name, value) in [("gains.kp", g.kp), ("gains.ki", g.ki), ("gains.kd", g.kd)] {
            Self::check_gain(name, value, &mut errors);
        }

        let a = &self.adjustments;
        for (name, value) in [
            ("adjustments.steady_state_ki", a.steady_state_ki),
            ("adjustments.excessive_overshoot_kp", a.excessive_overshoot_kp),
            ("adjustments.moderate_overshoot_kd", a.moderate_overshoot_kd),
            ("adjustments.oscillation_kp", a.oscillation_kp),
            ("adjustments.oscillation_ki", a.oscillation_ki),
            ("adjustments.slow_response_kp", a.slow_response_kp),
            ("fine_tuning.faster_response_kp", self.fine_tuning.faster_response_kp),
            ("fine_tuning.less_overshoot_kp", self.fine_tuning.less_overshoot_kp),
        ] {
            Self::check_gain(name, value, &mut errors);
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.steady_state_error_high", t.steady_state_error_high),
            ("thresholds.overshoot_excessive", t.overshoot_excessive),
            ("thresholds.overshoot_moderate", t.overshoot_moderate),
            ("thresholds.oscillations_high", t.oscillations_high),
        ] {
            if !value.is_finite() {
                errors.push(format!("{name} must be finite (got {value})"));
            } else if value < 0.0 {
                errors.push(format!("{name} = {value:.3} cannot be negative"));
            }
        }

        if t.overshoot_excessive.is_finite()
            && t.overshoot_moderate.is_finite()
            && t.overshoot_excessive <= t.overshoot_moderate
        {
            errors.push(format!(
                "thresholds.overshoot_excessive ({:.2}) must be greater than overshoot_moderate ({:.2})",
                t.overshoot_excessive, t.overshoot_moderate
            ));
        }

        Self::check_fraction("thresholds.slow_rise_fraction", t.slow_rise_fraction, &mut errors);
        Self::check_fraction("thresholds.slow_step_majority", t.slow_step_majority, &mut errors);
        Self::check_fraction("analysis.rise_fraction", self.analysis.rise_fraction, &mut errors);

        if self.analysis.steady_state_window == 0 {
            errors.push("analysis.steady_state_window must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_tuning_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_gain(name: &str, value: f64, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, so check finiteness first
        if !value.is_finite() {
            errors.push(format!("{name} must be finite (got {value})"));
        } else if value < 0.0 {
            errors.push(format!("{name} = {value:.3} cannot be negative"));
        }
    }

    fn check_fraction(name: &str, value: f64, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            errors.push(format!("{name} = {value} must be in (0, 1]"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({path}): {1}", path = .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Gains
// ============================================================================

/// PID gains of the controller that produced the analysed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainsConfig {
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default = "default_ki")]
    pub ki: f64,
    #[serde(default = "default_kd")]
    pub kd: f64,
}

fn default_kp() -> f64 {
    defaults::BASE_KP
}
fn default_ki() -> f64 {
    defaults::BASE_KI
}
fn default_kd() -> f64 {
    defaults::BASE_KD
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
        }
    }
}

// ============================================================================
// Rule Thresholds
// ============================================================================

/// Trigger thresholds for the recommendation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// max |ss_error| above this fires the steady-state rule (°C)
    #[serde(default = "default_ss_error_high")]
    pub steady_state_error_high: f64,
    /// avg overshoot above this fires the excessive-overshoot branch (°C)
    #[serde(default = "default_overshoot_excessive")]
    pub overshoot_excessive: f64,
    /// avg overshoot above this fires the moderate-overshoot branch (°C)
    #[serde(default = "default_overshoot_moderate")]
    pub overshoot_moderate: f64,
    /// avg oscillations above this fires the oscillation rule
    #[serde(default = "default_oscillations_high")]
    pub oscillations_high: f64,
    /// Rise time above this fraction of duration marks a step slow
    #[serde(default = "default_slow_rise_fraction")]
    pub slow_rise_fraction: f64,
    /// Slow steps above this fraction of all steps fires the slow-response rule
    #[serde(default = "default_slow_step_majority")]
    pub slow_step_majority: f64,
}

fn default_ss_error_high() -> f64 {
    defaults::STEADY_STATE_ERROR_HIGH
}
fn default_overshoot_excessive() -> f64 {
    defaults::OVERSHOOT_EXCESSIVE
}
fn default_overshoot_moderate() -> f64 {
    defaults::OVERSHOOT_MODERATE
}
fn default_oscillations_high() -> f64 {
    defaults::OSCILLATIONS_HIGH
}
fn default_slow_rise_fraction() -> f64 {
    defaults::SLOW_RISE_FRACTION
}
fn default_slow_step_majority() -> f64 {
    defaults::SLOW_STEP_MAJORITY
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            steady_state_error_high: default_ss_error_high(),
            overshoot_excessive: default_overshoot_excessive(),
            overshoot_moderate: default_overshoot_moderate(),
            oscillations_high: default_oscillations_high(),
            slow_rise_fraction: default_slow_rise_fraction(),
            slow_step_majority: default_slow_step_majority(),
        }
    }
}

// ============================================================================
// Gain Adjustments
// ============================================================================

/// Gain values each rule proposes when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainAdjustments {
    #[serde(default = "default_steady_state_ki")]
    pub steady_state_ki: f64,
    #[serde(default = "default_excessive_overshoot_kp")]
    pub excessive_overshoot_kp: f64,
    #[serde(default = "default_moderate_overshoot_kd")]
    pub moderate_overshoot_kd: f64,
    #[serde(default = "default_oscillation_kp")]
    pub oscillation_kp: f64,
    #[serde(default = "default_oscillation_ki")]
    pub oscillation_ki: f64,
    #[serde(default = "default_slow_response_kp")]
    pub slow_response_kp: f64,
}

fn default_steady_state_ki() -> f64 {
    defaults::STEADY_STATE_KI
}
fn default_excessive_overshoot_kp() -> f64 {
    defaults::EXCESSIVE_OVERSHOOT_KP
}
fn default_moderate_overshoot_kd() -> f64 {
    defaults::MODERATE_OVERSHOOT_KD
}
fn default_oscillation_kp() -> f64 {
    defaults::OSCILLATION_KP
}
fn default_oscillation_ki() -> f64 {
    defaults::OSCILLATION_KI
}
fn default_slow_response_kp() -> f64 {
    defaults::SLOW_RESPONSE_KP
}

impl Default for GainAdjustments {
    fn default() -> Self {
        Self {
            steady_state_ki: default_steady_state_ki(),
            excessive_overshoot_kp: default_excessive_overshoot_kp(),
            moderate_overshoot_kd: default_moderate_overshoot_kd(),
            oscillation_kp: default_oscillation_kp(),
            oscillation_ki: default_oscillation_ki(),
            slow_response_kp: default_slow_response_kp(),
        }
    }
}

// ============================================================================
// Fine Tuning
// ============================================================================

/// Kp alternatives printed for a healthy loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineTuningConfig {
    #[serde(default = "default_faster_response_kp")]
    pub faster_response_kp: f64,
    #[serde(default = "default_less_overshoot_kp")]
    pub less_overshoot_kp: f64,
}

fn default_faster_response_kp() -> f64 {
    defaults::FINE_TUNE_FASTER_KP
}
fn default_less_overshoot_kp() -> f64 {
    defaults::FINE_TUNE_LESS_OVERSHOOT_KP
}

impl Default for FineTuningConfig {
    fn default() -> Self {
        Self {
            faster_response_kp: default_faster_response_kp(),
            less_overshoot_kp: default_less_overshoot_kp(),
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Order in which step runs are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrder {
    /// Lexicographic by step identifier
    #[default]
    ByName,
    /// Order of each step's first appearance in the log
    FirstSeen,
}

/// Metric computation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Trailing samples averaged for the steady-state error
    #[serde(default = "default_steady_state_window")]
    pub steady_state_window: usize,
    /// Fraction of the commanded change that defines rise time
    #[serde(default = "default_rise_fraction")]
    pub rise_fraction: f64,
    /// Report ordering of step runs
    #[serde(default)]
    pub step_order: StepOrder,
}

fn default_steady_state_window() -> usize {
    defaults::STEADY_STATE_WINDOW
}
fn default_rise_fraction() -> f64 {
    defaults::RISE_FRACTION
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            steady_state_window: default_steady_state_window(),
            rise_fraction: default_rise_fraction(),
            step_order: StepOrder::default(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
