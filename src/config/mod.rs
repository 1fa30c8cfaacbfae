//! Tuning Configuration Module
//!
//! Provides the analysis constants (base gains, rule thresholds, proposed
//! gain values) as operator-tunable TOML values.
//!
//! ## Loading Order
//!
//! 1. `REFLOW_TUNE_CONFIG` environment variable (path to TOML file)
//! 2. `reflow_tune.toml` in the current working directory
//! 3. Built-in defaults (the constants the controller team tunes against)
//!
//! ## Usage
//!
//! ```ignore
//! let config = TuningConfig::load();
//! let report = analysis::run_analysis(&log, &config)?;
//! ```
//!
//! The configuration is passed by reference into every analysis stage; there
//! is no process-wide instance.

mod tuning_config;
pub mod defaults;
pub mod validation;

pub use tuning_config::*;
