//! Synthetic fleet generation.
//!
//! Produces stress histories and matching crack-length ground truth in the
//! same CSV layout the loader reads. Every unit gets its own mean stress
//! level and a perturbed geometry factor, and its ground truth comes from
//! the analytical recursion run with that factor, so the fleet scatters
//! around what the nominal physics model predicts.

use ndarray::{Array2, Axis};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

use crate::fleet::{initial_crack_column, StressBatch};
use crate::physics::PhysicsConstants;
use crate::rnn::{AnalyticalModelConfig, CrackGrowthModel, ModelError, ModelFactory, NativeModelFactory};
use crate::types::{BatchShape, Precision};

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("Invalid noise level: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error("{name} must be finite and >= 0 (got {value})")]
    InvalidSpread { name: &'static str, value: f64 },

    #[error("Ground truth recursion failed: {0}")]
    Model(#[from] ModelError),
}

/// Fleet generation settings.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub units: usize,
    pub cycles: usize,
    /// Fleet-wide mean stress amplitude.
    pub mean_stress: f64,
    /// Standard deviation of each unit's mean stress around `mean_stress`.
    pub unit_stress_spread: f64,
    /// Cycle-to-cycle standard deviation within a unit.
    pub cycle_stress_std: f64,
    /// Relative standard deviation of the per-unit geometry factor.
    pub geometry_spread: f64,
    pub seed: Option<u64>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            units: 300,
            cycles: 7300,
            mean_stress: 85.0,
            unit_stress_spread: 8.0,
            cycle_stress_std: 10.0,
            geometry_spread: 0.05,
            seed: None,
        }
    }
}

/// Generated fleet.
#[derive(Debug, Clone)]
pub struct SyntheticFleet {
    pub labels: Vec<String>,
    /// Stress, `(cycles, units)`.
    pub stress: Array2<f64>,
    /// Ground-truth crack length after each cycle, `(cycles, units)`.
    pub crack_length: Array2<f64>,
    /// Geometry factor each unit was grown with.
    pub geometry_factors: Vec<f64>,
}

/// Generate a fleet whose ground truth follows the analytical recursion.
pub fn generate(
    config: &SynthConfig,
    constants: &PhysicsConstants,
    initial_crack_length: f64,
    precision: Precision,
) -> Result<SyntheticFleet, SynthError> {
    for (name, value) in [
        ("unit_stress_spread", config.unit_stress_spread),
        ("cycle_stress_std", config.cycle_stress_std),
        ("geometry_spread", config.geometry_spread),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SynthError::InvalidSpread { name, value });
        }
    }

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let unit_noise = Normal::new(0.0, config.unit_stress_spread)?;
    let cycle_noise = Normal::new(0.0, config.cycle_stress_std)?;
    let geometry_noise = Normal::new(0.0, config.geometry_spread)?;

    let mut stress = Array2::<f64>::zeros((config.cycles, config.units));
    let mut crack_length = Array2::<f64>::zeros((config.cycles, config.units));
    let mut geometry_factors = Vec::with_capacity(config.units);

    for unit in 0..config.units {
        let unit_mean = (config.mean_stress + unit_noise.sample(&mut rng)).max(0.0);
        for cycle in 0..config.cycles {
            let s = (unit_mean + cycle_noise.sample(&mut rng)).max(0.0);
            stress[[cycle, unit]] = precision.quantize(s);
        }

        let f = constants.geometry_factor * (1.0 + geometry_noise.sample(&mut rng)).max(0.1);
        geometry_factors.push(f);

        let series = stress.index_axis(Axis(1), unit).to_owned().insert_axis(Axis(0));
        let model = NativeModelFactory.build_analytical_model(AnalyticalModelConfig {
            geometry_factor: f,
            paris_coefficient: constants.paris_coefficient,
            paris_exponent: constants.paris_exponent,
            batch_input_shape: BatchShape::new(1, config.cycles),
            initial_crack: initial_crack_column(1, initial_crack_length, precision),
            precision,
            return_sequences: true,
        })?;
        let trajectory = model.predict_on_batch(&StressBatch::from_unit_major(&series))?;
        crack_length
            .index_axis_mut(Axis(1), unit)
            .assign(&trajectory.lengths().row(0));
    }

    tracing::info!(
        units = config.units,
        cycles = config.cycles,
        seed = ?config.seed,
        "Synthetic fleet generated"
    );

    Ok(SyntheticFleet {
        labels: (0..config.units).map(|u| format!("unit_{u}")).collect(),
        stress,
        crack_length,
        geometry_factors,
    })
}

/// Write a `(rows, columns)` table with a header row of labels.
pub fn write_csv(path: &Path, labels: &[String], values: &Array2<f64>) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str(&labels.join(","));
    out.push('\n');
    for row in values.rows() {
        for (i, v) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{v}");
        }
        out.push('\n');
    }
    crate::persist::write_atomic(path, out.as_bytes())
}
