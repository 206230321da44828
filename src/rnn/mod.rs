//! Recursive crack-growth models.
//!
//! Two models share one recursion and differ only in where the
//! stress-intensity range comes from:
//!
//! - **Hybrid model**: a pretrained dense regressor (`DK_MLP`) maps
//!   `[stress, crack_length]` to ΔK inside the Paris-law recursion. Its
//!   weights are restored from a checkpoint directory.
//! - **Physics model**: ΔK = F * S * sqrt(π a) in closed form.
//!
//! ## Recursion (per unit)
//!
//! ```text
//! a[0] = a0
//! for each cycle t:
//!   dK   = K(S[t], a[t-1])
//!   a[t] = a[t-1] + C * max(dK, 0)^m
//! ```
//!
//! Models are built through a [`factory::ModelFactory`] and evaluated with
//! [`CrackGrowthModel::predict_on_batch`]. No training happens here: the
//! regressor's trainable flag is carried but inference never updates weights.

pub mod scaling;
pub mod mlp;
pub mod cell;
pub mod model;
pub mod checkpoint;
pub mod factory;

pub use cell::{AnalyticalStressIntensity, CumulativeDamageCell, StressIntensity};
pub use checkpoint::{HybridCheckpoint, RestoreWeights};
pub use factory::{AnalyticalModelConfig, LearnedModelConfig, ModelFactory, NativeModelFactory};
pub use mlp::{Activation, DenseLayer, DenseRegressor, RegressorSignature};
pub use model::{CumulativeDamageModel, HybridModel, PhysicsModel};
pub use scaling::InputScaling;

use ndarray::Array2;
use std::path::PathBuf;
use thiserror::Error;

use crate::fleet::StressBatch;
use crate::types::BatchShape;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid regressor: {0}")]
    InvalidRegressor(String),

    #[error("Batch shape mismatch: model expects {expected}, got {found}")]
    ShapeMismatch { expected: BatchShape, found: BatchShape },

    #[error("Initial crack column must be ({units}, 1), got {found:?}")]
    InitialCondition { units: usize, found: (usize, usize) },

    #[error("Initial crack lengths must be finite and positive")]
    InvalidInitialCrack,

    #[error("Incompatible checkpoint: {0}")]
    IncompatibleCheckpoint(String),

    #[error("Unsupported checkpoint version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// A recursive model evaluated over a whole fleet batch at once.
pub trait CrackGrowthModel {
    /// Batch shape the model was built for.
    fn batch_shape(&self) -> BatchShape;

    /// Run the recursion over every unit of `batch`.
    fn predict_on_batch(&self, batch: &StressBatch) -> Result<CrackPrediction, ModelError>;
}

/// Predicted crack lengths, `(units, steps)`.
///
/// `steps` is the cycle count when the model returns sequences, otherwise 1.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackPrediction {
    lengths: Array2<f64>,
}

impl CrackPrediction {
    pub fn new(lengths: Array2<f64>) -> Self {
        Self { lengths }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.lengths.dim()
    }

    pub fn lengths(&self) -> &Array2<f64> {
        &self.lengths
    }

    /// Crack length after the last cycle, one entry per unit.
    pub fn final_cycle(&self) -> Vec<f64> {
        let steps = self.lengths.ncols();
        if steps == 0 {
            return Vec::new();
        }
        self.lengths.column(steps - 1).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_cycle_is_last_column() {
        let pred = CrackPrediction::new(
            Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("shape"),
        );
        assert_eq!(pred.final_cycle(), vec![3.0, 6.0]);
        assert_eq!(pred.lengths().dim(), (2, 3));
    }

    #[test]
    fn test_empty_prediction() {
        let pred = CrackPrediction::new(Array2::zeros((4, 0)));
        assert!(pred.final_cycle().is_empty());
    }
}
