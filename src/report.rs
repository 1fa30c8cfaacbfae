//! Report rendering
//!
//! Text for the console and pretty JSON for tooling. Both are pure
//! functions of a finished `TuningReport`; the generation timestamp is
//! passed in so output is reproducible under test.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::recommendation::fmt_gain;
use crate::types::TuningReport;

const WIDTH: usize = 70;

/// Where the controller constructs its PID loop
const APPLY_LOCATION: &str = "the reflow controller's PidController::new call";

fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(WIDTH).collect()
}

/// Render the human-readable report
pub fn render_text(report: &TuningReport, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_text(&mut out, report, generated_at);
    out
}

fn write_text(
    out: &mut String,
    report: &TuningReport,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    let base = report.advice.plan.base;
    let heavy = rule('=');
    let light = rule('-');

    writeln!(out, "{heavy}")?;
    writeln!(out, "PID PERFORMANCE ANALYSIS")?;
    writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "{heavy}")?;

    writeln!(out)?;
    writeln!(
        out,
        "Loaded {} samples, {:.1}s to {:.1}s",
        report.data.sample_count, report.data.first_time_s, report.data.last_time_s
    )?;

    writeln!(out)?;
    writeln!(out, "Current PID Parameters:")?;
    writeln!(out, "  Kp = {}", fmt_gain(base.kp))?;
    writeln!(out, "  Ki = {}", fmt_gain(base.ki))?;
    writeln!(out, "  Kd = {}", fmt_gain(base.kd))?;

    writeln!(out)?;
    writeln!(out, "{light}")?;
    writeln!(out, "Performance by Step:")?;
    writeln!(out, "{light}")?;

    for m in &report.steps {
        writeln!(out)?;
        writeln!(out, "{:15} Target: {:6.1}°C  ({})", m.step_name, m.target, m.direction)?;
        writeln!(out, "  Duration:       {:6.1}s", m.duration)?;
        writeln!(out, "  Rise Time:      {:6.1}s", m.rise_time)?;
        writeln!(out, "  Overshoot:      {:6.1}°C", m.overshoot)?;
        writeln!(out, "  Mean Error:     {:6.1}°C", m.mean_error)?;
        writeln!(out, "  Max Error:      {:6.1}°C", m.max_error)?;
        writeln!(out, "  SS Error:       {:6.1}°C", m.ss_error)?;
        writeln!(out, "  Oscillations:   {:6.1}", m.oscillations)?;
    }

    writeln!(out)?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "RECOMMENDATIONS")?;
    writeln!(out, "{heavy}")?;

    let advice = &report.advice;
    if advice.is_performing_well() {
        writeln!(out)?;
        writeln!(out, "PID controller is performing well!")?;
        if let Some(fine) = advice.fine_tuning {
            writeln!(out)?;
            writeln!(out, "Optional fine-tuning:")?;
            writeln!(out, "  - For faster response: Kp = {}", fmt_gain(fine.faster_response_kp))?;
            writeln!(out, "  - For less overshoot: Kp = {}", fmt_gain(fine.less_overshoot_kp))?;
        }
    } else {
        writeln!(out)?;
        writeln!(out, "Found {} issue(s):", advice.recommendations.len())?;
        writeln!(out)?;
        for (i, rec) in advice.recommendations.iter().enumerate() {
            writeln!(out, "{}. [{}] {}", i + 1, rec.priority, rec.issue.headline())?;
            writeln!(out, "   Action: {}", rec.action)?;
            writeln!(out)?;
        }

        let proposed = advice.plan.proposed();
        writeln!(out, "{light}")?;
        writeln!(out, "SUGGESTED PID VALUES:")?;
        writeln!(out, "{light}")?;
        writeln!(out)?;
        writeln!(out, "  Kp = {}", fmt_gain(proposed.kp))?;
        writeln!(out, "  Ki = {}", fmt_gain(proposed.ki))?;
        writeln!(out, "  Kd = {}", fmt_gain(proposed.kd))?;

        if advice.plan.is_changed() {
            writeln!(out)?;
            writeln!(out, "To apply, update {APPLY_LOCATION}:")?;
            writeln!(
                out,
                "  pid_controller: PidController::new({}, {}, {}),",
                fmt_gain(proposed.kp),
                fmt_gain(proposed.ki),
                fmt_gain(proposed.kd)
            )?;
        }
    }

    let s = &report.summary;
    writeln!(out)?;
    writeln!(out, "{heavy}")?;
    writeln!(out)?;
    writeln!(out, "Data Summary:")?;
    writeln!(out, "  Total runtime: {:.1}s", report.data.total_runtime_s())?;
    writeln!(out, "  Steps completed: {}", s.total_steps)?;
    writeln!(out, "  Average overshoot: {:.1}°C", s.avg_overshoot)?;
    writeln!(out, "  Average oscillations: {:.1}", s.avg_oscillations)?;
    writeln!(out, "  Max steady-state error: {:.1}°C", s.max_ss_error)?;

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a TuningReport,
}

/// Render the report as pretty-printed JSON
pub fn render_json(
    report: &TuningReport,
    generated_at: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at,
        report,
    })
}
