//! reflow-tune - Reflow Oven PID Loop Diagnostics
//!
//! Reads a captured run log, measures control quality per profile step and
//! prints gain recommendations.
//!
//! # Usage
//!
//! ```bash
//! # Analyse ./reflow_data.csv with the default or discovered config
//! reflow-tune
//!
//! # Analyse a specific log and emit JSON
//! reflow-tune --csv runs/lead_free.csv --json
//!
//! # Turn a raw controller capture into a run log
//! reflow-tune flatten --from capture.jsonl --to reflow_data.csv
//!
//! # Show the effective configuration
//! reflow-tune check-config --config reflow_tune.toml
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level); the report goes to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use reflow_tune::config::defaults::DEFAULT_LOG_FILE;
use reflow_tune::telemetry::capture;
use reflow_tune::{analysis, report, AnalysisError, LoadError, TuningConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "reflow-tune")]
#[command(about = "Reflow oven PID loop diagnostics")]
#[command(version)]
struct CliArgs {
    /// Path to the run log CSV
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    csv: PathBuf,

    /// Path to a TOML config; skips the REFLOW_TUNE_CONFIG / ./reflow_tune.toml search
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Flatten a captured controller message stream into a run log CSV
    Flatten {
        /// Captured newline-delimited JSON messages
        #[arg(long = "from")]
        from: PathBuf,
        /// Output CSV path
        #[arg(long = "to", default_value = DEFAULT_LOG_FILE)]
        to: PathBuf,
    },

    /// Load and validate a config, then print the effective TOML
    CheckConfig {
        /// Config file to check (defaults to the standard search order)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// Commands
// ============================================================================

/// An explicit path is fatal on error; otherwise fall back through the search order
fn load_config(path: Option<&Path>) -> Result<TuningConfig> {
    match path {
        Some(p) => TuningConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(TuningConfig::load()),
    }
}

const MISSING_LOG_HINT: &str =
    "No run log to analyse; capture a run first, e.g. `reflow-tune flatten --from capture.jsonl`";

fn run_analyze(args: &CliArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let result = match analysis::analyze_file(&args.csv, &config) {
        Ok(result) => result,
        Err(e @ AnalysisError::Load(LoadError::InputNotFound(_))) => {
            return Err(e).context(MISSING_LOG_HINT);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Analysis of {} failed", args.csv.display()));
        }
    };

    let generated_at = chrono::Utc::now();
    if args.json {
        let json = report::render_json(&result, generated_at).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", report::render_text(&result, generated_at));
    }

    Ok(())
}

fn run_flatten(from: &Path, to: &Path) -> Result<()> {
    info!("Flattening capture: {} -> {}", from.display(), to.display());
    let summary = capture::flatten_file(from, to)
        .with_context(|| format!("Failed to flatten {}", from.display()))?;
    println!(
        "Wrote {} records to {} ({} lines skipped)",
        summary.records_written,
        to.display(),
        summary.lines_skipped
    );
    Ok(())
}

fn run_check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate().context("Config validation failed")?;
    print!("{}", config.to_toml()?);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging on stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match &args.command {
        Some(SubCommand::Flatten { from, to }) => run_flatten(from, to),
        Some(SubCommand::CheckConfig { config }) => run_check_config(config.as_deref()),
        None => run_analyze(&args),
    }
}
