//! System-wide default constants.
//!
//! Every value here is the built-in default for a `TuningConfig` field.

// ============================================================================
// Controller Gains
// ============================================================================

/// Proportional gain flashed into the controller firmware.
pub const BASE_KP: f64 = 3.0;

/// Integral gain flashed into the controller firmware.
pub const BASE_KI: f64 = 0.5;

/// Derivative gain flashed into the controller firmware.
pub const BASE_KD: f64 = 0.0;

// ============================================================================
// Rule Thresholds
// ============================================================================

/// Largest |steady-state error| tolerated before the integral term is raised (°C).
pub const STEADY_STATE_ERROR_HIGH: f64 = 5.0;

/// Mean overshoot above which Kp is cut (°C).
pub const OVERSHOOT_EXCESSIVE: f64 = 10.0;

/// Mean overshoot above which a derivative term is added (°C).
pub const OVERSHOOT_MODERATE: f64 = 5.0;

/// Mean oscillation cycles per step above which the loop is considered unstable.
pub const OSCILLATIONS_HIGH: f64 = 3.0;

/// A step is slow when its rise time exceeds this fraction of its duration.
pub const SLOW_RISE_FRACTION: f64 = 0.6;

/// Slow response fires when more than this fraction of steps are slow.
pub const SLOW_STEP_MAJORITY: f64 = 0.5;

// ============================================================================
// Proposed Gains
// ============================================================================

/// Ki proposed for high steady-state error.
pub const STEADY_STATE_KI: f64 = 0.75;

/// Kp proposed for excessive overshoot.
pub const EXCESSIVE_OVERSHOOT_KP: f64 = 2.4;

/// Kd proposed for moderate overshoot.
pub const MODERATE_OVERSHOOT_KD: f64 = 0.3;

/// Kp proposed for an oscillating loop.
pub const OSCILLATION_KP: f64 = 2.1;

/// Ki proposed for an oscillating loop.
pub const OSCILLATION_KI: f64 = 0.4;

/// Kp proposed for slow response.
pub const SLOW_RESPONSE_KP: f64 = 3.9;

/// Kp offered for a faster response when the loop is already healthy.
pub const FINE_TUNE_FASTER_KP: f64 = 3.3;

/// Kp offered for less overshoot when the loop is already healthy.
pub const FINE_TUNE_LESS_OVERSHOOT_KP: f64 = 2.7;

// ============================================================================
// Metrics
// ============================================================================

/// Number of trailing samples averaged for the steady-state error.
pub const STEADY_STATE_WINDOW: usize = 10;

/// Fraction of the commanded change that defines rise time.
pub const RISE_FRACTION: f64 = 0.9;

// ============================================================================
// Files
// ============================================================================

/// Run log analysed when no path is given.
pub const DEFAULT_LOG_FILE: &str = "reflow_data.csv";

/// Config file searched for in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "reflow_tune.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "REFLOW_TUNE_CONFIG";
