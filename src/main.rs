//! fleet-crack-rnn - Hybrid vs Physics Crack Growth Evaluation
//!
//! Runs the pretrained hybrid recursive model and the analytical Paris-law
//! recursion over a fleet's stress histories, scores both on final-cycle
//! crack length and renders the predicted-vs-actual comparison.
//!
//! # Usage
//!
//! ```bash
//! # Reference study with files in the working directory
//! cargo run --release
//!
//! # Explicit inputs and a JSON report
//! cargo run --release -- --crack-csv data/aFleet_5yrs.csv \
//!     --stress-csv data/SFleet_5yrs.csv --report report.json
//! ```
//!
//! # Environment Variables
//!
//! - `CRACK_RNN_CONFIG`: Path to a TOML run config
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fleet_crack_rnn::config::RunConfig;
use fleet_crack_rnn::evaluation::{run_evaluation, EvaluationReport, HYBRID_LABEL, PHYSICS_LABEL};
use fleet_crack_rnn::plot::{PredictionPlot, ScatterSeries};
use fleet_crack_rnn::rnn::NativeModelFactory;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-crack-rnn")]
#[command(about = "Evaluate a hybrid physics-informed RNN against the Paris-law model on a fleet")]
#[command(version)]
struct CliArgs {
    /// Run config TOML (overrides CRACK_RNN_CONFIG and ./crack_config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ground-truth crack length CSV (one column per unit, one row per cycle)
    #[arg(long, value_name = "PATH")]
    crack_csv: Option<PathBuf>,

    /// Stress history CSV (same layout as the crack CSV)
    #[arg(long, value_name = "PATH")]
    stress_csv: Option<PathBuf>,

    /// Serialized ΔK regressor (DK_MLP.json)
    #[arg(long, value_name = "PATH")]
    mlp: Option<PathBuf>,

    /// Hybrid checkpoint directory containing cp.json
    #[arg(long, value_name = "DIR")]
    checkpoint_dir: Option<PathBuf>,

    /// SVG output path for the prediction plot
    #[arg(long, value_name = "PATH")]
    plot: Option<PathBuf>,

    /// Skip rendering the plot
    #[arg(long, conflicts_with = "plot")]
    no_plot: bool,

    /// Also write the evaluation report as JSON
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the run config, then apply command-line overrides.
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RunConfig::load().context("Failed to load run config")?,
        };

        if let Some(p) = &self.crack_csv {
            config.data.crack_csv = p.clone();
        }
        if let Some(p) = &self.stress_csv {
            config.data.stress_csv = p.clone();
        }
        if let Some(p) = &self.mlp {
            config.model.mlp_path = p.clone();
        }
        if let Some(p) = &self.checkpoint_dir {
            config.model.checkpoint_dir = p.clone();
        }
        if let Some(p) = &self.plot {
            config.plot.output_path = p.clone();
        }
        Ok(config)
    }
}

fn render_plot(report: &EvaluationReport, config: &RunConfig) -> Result<()> {
    let mut plot = PredictionPlot::new(&config.plot).context("Invalid plot settings")?;
    plot.add_series(ScatterSeries::with_metrics(
        PHYSICS_LABEL,
        &report.actual_final,
        &report.physics.predicted_final,
        &report.physics.metrics,
    ))?;
    plot.add_series(ScatterSeries::with_metrics(
        HYBRID_LABEL,
        &report.actual_final,
        &report.hybrid.predicted_final,
        &report.hybrid.metrics,
    ))?;
    plot.save(&config.plot.output_path)
        .with_context(|| format!("Failed to write plot {}", config.plot.output_path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = args.run_config()?;

    info!(
        crack_csv = %config.data.crack_csv.display(),
        stress_csv = %config.data.stress_csv.display(),
        mlp = %config.model.mlp_path.display(),
        checkpoint_dir = %config.model.checkpoint_dir.display(),
        "Starting fleet evaluation"
    );

    let report = run_evaluation(&NativeModelFactory, &config).context("Fleet evaluation failed")?;

    println!();
    print!("{}", report.summary());
    println!();

    if args.no_plot {
        info!("Plot rendering skipped (--no-plot)");
    } else {
        render_plot(&report, &config)?;
        println!("Plot: {}", config.plot.output_path.display());
    }

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report: {}", path.display());
    }

    Ok(())
}
