//! Pipeline Regression Tests
//!
//! Drives the full pipeline (file → load → segment → metrics → aggregate →
//! rules → report) over synthetic run logs written to a temp directory.
//! Covers the reference scenarios, determinism and the error taxonomy.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use reflow_tune::analysis::{analyze_file, RecommendationEngine};
use reflow_tune::report::{render_json, render_text};
use reflow_tune::{
    AggregateSummary, AnalysisError, LoadError, StepOrder, TuningConfig, TuningIssue,
};

const HEADER: &str =
    "time_ms,status,target_temp,current_temp,heater_power,step,profile,door_closed,fan,timer";

/// One step: (name, target, temperatures sampled once per second)
type StepRows<'a> = (&'a str, f64, Vec<f64>);

fn write_log(dir: &Path, name: &str, steps: &[StepRows<'_>]) -> PathBuf {
    let mut csv = String::new();
    writeln!(csv, "{HEADER}").expect("write header");
    writeln!(csv, "0,Idle,25.00,25.00,0,,Lead-free,true,false,0").expect("write idle row");

    let mut t_ms = 1000u64;
    for (step, target, temps) in steps {
        for temp in temps {
            writeln!(
                csv,
                "{t_ms},Running,{target:.2},{temp:.2},80,{step},Lead-free,true,false,{}",
                t_ms / 1000
            )
            .expect("write row");
            t_ms += 1000;
        }
    }
    writeln!(csv, "{t_ms},Done,25.00,60.00,0,,Lead-free,true,true,0").expect("write done row");

    let path = dir.join(name);
    std::fs::write(&path, csv).expect("write log file");
    path
}

/// Ramp from `start` to just under `target`, then hold
fn settle(start: f64, target: f64, hold: usize) -> Vec<f64> {
    let mut temps = vec![
        start,
        start + (target - start) * 0.4,
        start + (target - start) * 0.8,
        target - 0.2,
    ];
    temps.extend(std::iter::repeat(target - 0.2).take(hold));
    temps
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid timestamp")
}

// ============================================================================
// Reference Scenarios
// ============================================================================

#[test]
fn scenario_a_well_tuned_profile_fires_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_log(
        dir.path(),
        "a.csv",
        &[
            ("Preheat", 150.0, settle(100.0, 150.0, 16)),
            ("Soak", 180.0, settle(150.0, 180.0, 16)),
            ("Reflow", 230.0, settle(180.0, 230.0, 16)),
        ],
    );

    let report = analyze_file(&path, &TuningConfig::default()).expect("analysis");

    assert_eq!(report.steps.len(), 3);
    for m in &report.steps {
        assert_eq!(m.overshoot, 0.0, "{} overshoot", m.step_name);
        assert!(m.ss_error.abs() < 1.0, "{} ss_error {}", m.step_name, m.ss_error);
        assert_eq!(m.rise_time, 3.0, "{} rise_time", m.step_name);
    }
    assert!(report.advice.is_performing_well());
    assert!(!report.advice.plan.is_changed());
    assert!(report.advice.fine_tuning.is_some());

    let text = render_text(&report, fixed_time());
    assert!(text.contains("PID controller is performing well!"));
}

#[test]
fn scenario_b_excessive_overshoot_lowers_kp() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut temps = vec![100.0, 130.0, 150.0, 165.0, 158.0, 152.0];
    temps.extend(std::iter::repeat(150.0).take(14));
    let path = write_log(dir.path(), "b.csv", &[("Reflow", 150.0, temps)]);

    let report = analyze_file(&path, &TuningConfig::default()).expect("analysis");

    assert_eq!(report.steps.len(), 1);
    assert!((report.summary.avg_overshoot - 15.0).abs() < 1e-9);
    assert!(report.summary.max_ss_error.abs() < 1e-9);

    let issues: Vec<TuningIssue> = report.advice.recommendations.iter().map(|r| r.issue).collect();
    assert_eq!(issues, vec![TuningIssue::ExcessiveOvershoot]);
    assert_eq!(report.advice.plan.new_kp, 2.4);
    assert_eq!(report.advice.plan.new_ki, 0.5);
    assert_eq!(report.advice.plan.new_kd, 0.0);

    let text = render_text(&report, fixed_time());
    assert!(text.contains("PidController::new(2.4, 0.5, 0.0)"));
}

#[test]
fn scenario_c_steady_state_only() {
    let summary = AggregateSummary {
        avg_overshoot: 3.0,
        avg_oscillations: 1.0,
        max_ss_error: 6.0,
        slow_step_count: 0,
        total_steps: 2,
    };
    let advice = RecommendationEngine::evaluate(&summary, &TuningConfig::default());

    assert_eq!(advice.recommendations.len(), 1);
    assert_eq!(advice.recommendations[0].issue, TuningIssue::HighSteadyStateError);
    assert_eq!(advice.plan.new_ki, 0.75);
    assert_eq!(advice.plan.new_kp, 3.0);
    assert_eq!(advice.plan.new_kd, 0.0);
}

// ============================================================================
// Ordering and Determinism
// ============================================================================

#[test]
fn steps_reported_by_name_unless_first_seen_requested() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_log(
        dir.path(),
        "order.csv",
        &[
            ("Soak", 180.0, settle(150.0, 180.0, 4)),
            ("Cooling", 50.0, vec![220.0, 150.0, 60.0, 55.0]),
            ("Preheat", 150.0, settle(100.0, 150.0, 4)),
        ],
    );

    let by_name = analyze_file(&path, &TuningConfig::default()).expect("analysis");
    let names: Vec<&str> = by_name.steps.iter().map(|m| m.step_name.as_str()).collect();
    assert_eq!(names, vec!["Cooling", "Preheat", "Soak"]);

    let mut config = TuningConfig::default();
    config.analysis.step_order = StepOrder::FirstSeen;
    let first_seen = analyze_file(&path, &config).expect("analysis");
    let names: Vec<&str> = first_seen.steps.iter().map(|m| m.step_name.as_str()).collect();
    assert_eq!(names, vec!["Soak", "Cooling", "Preheat"]);

    // Ordering never changes the aggregate
    assert_eq!(by_name.summary, first_seen.summary);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_log(
        dir.path(),
        "det.csv",
        &[
            ("Preheat", 150.0, vec![100.0, 140.0, 155.0, 148.0, 151.0, 149.0]),
            ("Cooling", 50.0, vec![220.0, 120.0, 60.0]),
        ],
    );

    let config = TuningConfig::default();
    let first = analyze_file(&path, &config).expect("first run");
    let second = analyze_file(&path, &config).expect("second run");

    assert_eq!(
        render_json(&first, fixed_time()).expect("json"),
        render_json(&second, fixed_time()).expect("json")
    );
    assert_eq!(render_text(&first, fixed_time()), render_text(&second, fixed_time()));
}

// ============================================================================
// Error Taxonomy
// ============================================================================

#[test]
fn missing_input_is_input_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = analyze_file(&dir.path().join("reflow_data.csv"), &TuningConfig::default());
    assert!(matches!(
        result,
        Err(AnalysisError::Load(LoadError::InputNotFound(_)))
    ));
}

#[test]
fn malformed_row_aborts_whole_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.csv");
    std::fs::write(
        &path,
        format!(
            "{HEADER}\n\
             1000,Running,150.00,100.00,80,Preheat,p,true,false,1\n\
             2000,Running,150.00,oops,80,Preheat,p,true,false,2\n\
             3000,Running,150.00,140.00,80,Preheat,p,true,false,3\n"
        ),
    )
    .expect("write");

    match analyze_file(&path, &TuningConfig::default()) {
        Err(AnalysisError::Load(LoadError::MalformedRecord { line, field, .. })) => {
            assert_eq!(line, 3);
            assert_eq!(field, "current_temp");
        }
        other => panic!("expected MalformedRecord, got {other:?}"),
    }
}

#[test]
fn clock_reset_mid_run_aborts_instead_of_flagging_slow_response() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("reboot.csv");
    std::fs::write(
        &path,
        format!(
            "{HEADER}\n\
             5000,Running,150.00,140.00,80,Preheat,p,true,false,5\n\
             6000,Running,150.00,149.00,80,Preheat,p,true,false,6\n\
             1000,Running,150.00,150.00,80,Preheat,p,true,false,1\n"
        ),
    )
    .expect("write");

    match analyze_file(&path, &TuningConfig::default()) {
        Err(AnalysisError::Load(LoadError::MalformedRecord { line, field, .. })) => {
            assert_eq!(line, 4);
            assert_eq!(field, "time_ms");
        }
        other => panic!("expected out-of-order MalformedRecord, got {other:?}"),
    }
}

#[test]
fn log_without_running_samples_is_empty_dataset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_log(dir.path(), "idle.csv", &[]);
    let result = analyze_file(&path, &TuningConfig::default());
    assert!(matches!(result, Err(AnalysisError::EmptyDataset)));
}
