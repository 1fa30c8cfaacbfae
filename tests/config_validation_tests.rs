//! Config Validation Tests
//!
//! Exercises typo detection, consistency checks and file loading of the
//! tuning configuration independently from the analysis pipeline.

use reflow_tune::config::validation::{
    known_config_keys, suggest_correction, validate_tuning_ranges, validate_unknown_keys,
};
use reflow_tune::config::{ConfigError, StepOrder, TuningConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_gain_key_warns_with_suggestion() {
    let toml_str = r#"
[gains]
kpp = 2.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "gains.kpp");
    assert!(
        warnings[0].suggestion.is_some(),
        "Should suggest a correction"
    );
}

#[test]
fn typo_in_section_name_warns() {
    let toml_str = r#"
[adjustment]
slow_response_kp = 4.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.iter().any(|w| w.field == "adjustment"));
    let section = warnings
        .iter()
        .find(|w| w.field == "adjustment")
        .expect("section warning");
    assert_eq!(section.suggestion.as_deref(), Some("adjustments"));
}

#[test]
fn warning_display_includes_suggestion() {
    let warnings = validate_unknown_keys("[analysis]\nrise_fractoin = 0.8\n");
    assert_eq!(warnings.len(), 1);
    let rendered = warnings[0].to_string();
    assert!(rendered.contains("analysis.rise_fractoin"));
    assert!(rendered.contains("did you mean 'analysis.rise_fraction'"));
}

#[test]
fn unknown_keys_never_fail_the_load() {
    let config = TuningConfig::from_toml_str("[plot]\nwidth = 12\n").expect("unknown keys only warn");
    assert_eq!(config, TuningConfig::default());
}

#[test]
fn every_known_leaf_is_suggestable() {
    let known = known_config_keys();
    for key in &known {
        assert_eq!(
            suggest_correction(key, &known).as_deref(),
            Some(*key),
            "exact key should suggest itself"
        );
    }
}

// ============================================================================
// Consistency Checks
// ============================================================================

#[test]
fn inverted_overshoot_thresholds_rejected() {
    let toml_str = r#"
[thresholds]
overshoot_excessive = 4.0
overshoot_moderate = 8.0
"#;
    match TuningConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("overshoot_excessive")));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn negative_gain_rejected() {
    let result = TuningConfig::from_toml_str("[gains]\nkd = -0.1\n");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn inf_threshold_rejected() {
    let result = TuningConfig::from_toml_str("[thresholds]\nsteady_state_error_high = inf\n");
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn unknown_step_order_is_parse_error() {
    let result = TuningConfig::from_toml_str("[analysis]\nstep_order = \"chronological\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_, _))));
}

#[test]
fn all_errors_reported_together() {
    let toml_str = r#"
[analysis]
steady_state_window = 0
rise_fraction = 2.0
"#;
    match TuningConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.len() >= 2, "expected both errors, got {errors:?}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn range_warnings_do_not_fail_validation() {
    let mut config = TuningConfig::default();
    config.thresholds.overshoot_excessive = 500.0;
    let (errors, warnings) = validate_tuning_ranges(&config);
    assert!(errors.is_empty());
    assert!(!warnings.is_empty());
    assert!(config.validate().is_ok());
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn load_from_file_applies_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("reflow_tune.toml");
    std::fs::write(
        &path,
        r#"
[gains]
kp = 2.5
ki = 0.3

[analysis]
step_order = "first_seen"
steady_state_window = 5
"#,
    )
    .expect("write config");

    let config = TuningConfig::load_from_file(&path).expect("load");
    assert_eq!(config.gains.kp, 2.5);
    assert_eq!(config.gains.ki, 0.3);
    assert_eq!(config.analysis.step_order, StepOrder::FirstSeen);
    assert_eq!(config.analysis.steady_state_window, 5);
    assert_eq!(config.thresholds.overshoot_excessive, 10.0);
}

#[test]
fn parse_error_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[gains\nkp = ").expect("write config");

    let err = TuningConfig::load_from_file(&path).expect_err("broken TOML");
    assert!(matches!(err, ConfigError::Parse(_, _)));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn serialized_defaults_reload_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("defaults.toml");
    std::fs::write(&path, TuningConfig::default().to_toml().expect("serialize")).expect("write");
    let reloaded = TuningConfig::load_from_file(&path).expect("reload");
    assert_eq!(reloaded, TuningConfig::default());
}
