//! Synthetic Fleet Generator
//!
//! Writes a crack-length / stress-history CSV pair shaped like the reference
//! fleet files, with ground truth grown by the analytical Paris-law recursion
//! around a perturbed geometry factor per unit. Optionally snapshots a ΔK
//! regressor into a hybrid checkpoint so the evaluation has a consistent
//! artifact pair to restore.
//!
//! # Usage
//! ```bash
//! ./fleet-synth --units 50 --cycles 2000 --seed 42 --out-dir data
//! ./fleet-synth --seed 42 --mlp DK_MLP.json --checkpoint-dir training_60_points
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fleet_crack_rnn::config::RunConfig;
use fleet_crack_rnn::fleet::initial_crack_column;
use fleet_crack_rnn::rnn::checkpoint::{checkpoint_path, save_to_disk};
use fleet_crack_rnn::rnn::{DenseRegressor, LearnedModelConfig, ModelFactory, NativeModelFactory};
use fleet_crack_rnn::synth::{self, SynthConfig};
use fleet_crack_rnn::types::BatchShape;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fleet-synth")]
#[command(about = "Synthetic fleet crack-growth data for fleet-crack-rnn")]
#[command(version)]
struct Args {
    /// Number of fleet units (CSV columns)
    #[arg(short, long, default_value = "300", value_parser = clap::value_parser!(u32).range(1..=100_000))]
    units: u32,

    /// Load cycles per unit (CSV rows)
    #[arg(short, long, default_value = "7300", value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    cycles: u32,

    /// Fleet-wide mean stress amplitude
    #[arg(long, default_value = "85.0")]
    mean_stress: f64,

    /// Cycle-to-cycle stress standard deviation
    #[arg(long, default_value = "10.0")]
    stress_std: f64,

    /// Relative spread of the per-unit geometry factor
    #[arg(long, default_value = "0.05")]
    geometry_spread: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for the CSV pair
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Run config supplying physics constants and file names
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ΔK regressor to snapshot into a hybrid checkpoint
    #[arg(long, value_name = "PATH")]
    mlp: Option<PathBuf>,

    /// Checkpoint directory written when --mlp is given
    #[arg(long, value_name = "DIR")]
    checkpoint_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let run = match &args.config {
        Some(path) => RunConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RunConfig::load().context("Failed to load run config")?,
    };

    let synth_config = SynthConfig {
        units: args.units as usize,
        cycles: args.cycles as usize,
        mean_stress: args.mean_stress,
        cycle_stress_std: args.stress_std,
        geometry_spread: args.geometry_spread,
        seed: args.seed,
        ..SynthConfig::default()
    };
    let precision = run.data.precision;
    let a0 = run.model.initial_crack_length;

    println!("{}", "=".repeat(60));
    println!("FLEET SYNTH · crack growth test data");
    println!("{}", "=".repeat(60));
    println!("  Units:           {}", synth_config.units);
    println!("  Cycles:          {}", synth_config.cycles);
    println!("  Mean stress:     {:.1} (σ {:.1} per cycle)", synth_config.mean_stress, synth_config.cycle_stress_std);
    println!("  Paris C, m:      {:e}, {}", run.model.paris_coefficient, run.model.paris_exponent);
    println!("  Initial crack:   {} m", a0);
    if let Some(seed) = args.seed {
        println!("  Random seed:     {}", seed);
    }
    println!();

    let fleet = synth::generate(&synth_config, &run.model.physics_constants(), a0, precision)
        .context("Fleet generation failed")?;

    let crack_name = run.data.crack_csv.file_name().map(PathBuf::from).unwrap_or_else(|| run.data.crack_csv.clone());
    let stress_name = run.data.stress_csv.file_name().map(PathBuf::from).unwrap_or_else(|| run.data.stress_csv.clone());
    let crack_path = args.out_dir.join(crack_name);
    let stress_path = args.out_dir.join(stress_name);

    synth::write_csv(&crack_path, &fleet.labels, &fleet.crack_length)
        .with_context(|| format!("Failed to write {}", crack_path.display()))?;
    synth::write_csv(&stress_path, &fleet.labels, &fleet.stress)
        .with_context(|| format!("Failed to write {}", stress_path.display()))?;
    println!("  Crack lengths -> {}", crack_path.display());
    println!("  Stress        -> {}", stress_path.display());

    if let Some(mlp_path) = &args.mlp {
        let regressor = DenseRegressor::load(mlp_path)
            .with_context(|| format!("Failed to load regressor {}", mlp_path.display()))?;
        let model = NativeModelFactory.build_learned_model(LearnedModelConfig {
            regressor,
            paris_coefficient: run.model.paris_coefficient,
            paris_exponent: run.model.paris_exponent,
            batch_input_shape: BatchShape::new(synth_config.units, synth_config.cycles),
            initial_crack: initial_crack_column(synth_config.units, a0, precision),
            precision,
            return_sequences: true,
        })?;

        let dir = args.checkpoint_dir.clone().unwrap_or_else(|| run.model.checkpoint_dir.clone());
        let path = checkpoint_path(&dir);
        let label = mlp_path.file_stem().map_or_else(|| "regressor".to_string(), |s| s.to_string_lossy().into_owned());
        save_to_disk(&model.snapshot(&label), &path)
            .with_context(|| format!("Failed to write checkpoint {}", path.display()))?;
        println!("  Checkpoint    -> {}", path.display());
    }

    let finals = fleet.crack_length.rows().into_iter().last().map(|r| r.to_vec()).unwrap_or_default();
    let max_final = finals.iter().copied().fold(0.0, f64::max);
    let mean_final = if finals.is_empty() { 0.0 } else { finals.iter().sum::<f64>() / finals.len() as f64 };
    println!();
    println!("  Final crack length: mean {:.4} m, max {:.4} m", mean_final, max_final);
    info!(units = synth_config.units, cycles = synth_config.cycles, "Done");
    Ok(())
}
