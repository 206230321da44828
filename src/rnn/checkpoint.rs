//! Hybrid model checkpoint types.
//!
//! Provides serializable snapshots of the hybrid model's weights, enabling:
//! - Disk persistence (atomic save/load)
//! - Restoring a freshly constructed hybrid model to its trained state
//!
//! A checkpoint carries the regressor's architecture signature next to the
//! weights. Restoring into a model whose regressor has a different
//! signature is refused rather than producing a silently wrong network.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::defaults::{CHECKPOINT_FILE, CHECKPOINT_VERSION};
use crate::rnn::mlp::{DenseRegressor, RegressorSignature};
use crate::rnn::model::HybridModel;
use crate::rnn::ModelError;

/// Snapshot of the hybrid model's weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridCheckpoint {
    /// Format version for forward compatibility.
    pub version: u32,
    /// Architecture the weights belong to.
    pub signature: RegressorSignature,
    /// Learned stress-intensity regressor weights.
    pub regressor: DenseRegressor,
    /// Paris constants stored alongside the weights (not trained).
    pub paris_coefficient: f64,
    pub paris_exponent: f64,
    /// Provenance.
    pub metadata: CheckpointMetadata,
}

/// Metadata attached to a checkpoint for provenance tracking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Free-form label (e.g. the training run name).
    pub label: String,
    /// Unix timestamp when the checkpoint was created.
    pub timestamp: i64,
    /// Number of fleet units in the batch the model was built for.
    pub units: usize,
    /// Number of cycles in the batch the model was built for.
    pub cycles: usize,
}

impl HybridModel {
    /// Create a serializable snapshot of this model's current weights.
    pub fn snapshot(&self, label: &str) -> HybridCheckpoint {
        let regressor = self.cell().stress_intensity().clone();
        let (paris_coefficient, paris_exponent) = self.cell().paris_constants();
        let shape = crate::rnn::CrackGrowthModel::batch_shape(self);
        HybridCheckpoint {
            version: CHECKPOINT_VERSION,
            signature: regressor.signature(),
            regressor,
            paris_coefficient,
            paris_exponent,
            metadata: CheckpointMetadata {
                label: label.to_string(),
                timestamp: chrono::Utc::now().timestamp(),
                units: shape.units,
                cycles: shape.cycles,
            },
        }
    }

    /// Restore weights from a checkpoint.
    ///
    /// Validates the format version and that the checkpoint's architecture
    /// matches this model's regressor. The regressor's trainable flag is kept.
    pub fn restore_from(&mut self, cp: &HybridCheckpoint) -> Result<(), ModelError> {
        if cp.version != CHECKPOINT_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: cp.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let ours = self.cell().stress_intensity().signature();
        if cp.signature != ours {
            return Err(ModelError::IncompatibleCheckpoint(format!(
                "architecture mismatch: checkpoint has [{}], model has [{}]",
                cp.signature, ours
            )));
        }
        // The stored weights must agree with the signature they claim
        if cp.regressor.signature() != cp.signature {
            return Err(ModelError::IncompatibleCheckpoint(format!(
                "checkpoint weights [{}] do not match its own signature [{}]",
                cp.regressor.signature(),
                cp.signature
            )));
        }
        cp.regressor.validate()?;

        let (c, m) = self.cell().paris_constants();
        if (cp.paris_coefficient, cp.paris_exponent) != (c, m) {
            tracing::warn!(
                configured_c = c,
                configured_m = m,
                checkpoint_c = cp.paris_coefficient,
                checkpoint_m = cp.paris_exponent,
                "Checkpoint Paris constants differ from configuration, using checkpoint values"
            );
        }

        let cell = self.cell_mut();
        cell.stress_intensity_mut().assign_weights(&cp.regressor);
        cell.set_paris_constants(cp.paris_coefficient, cp.paris_exponent);
        Ok(())
    }
}

/// Models whose weights can be restored from a checkpoint directory.
pub trait RestoreWeights {
    /// Restore weights from `<checkpoint_dir>/cp.json`.
    fn load_weights(&mut self, checkpoint_dir: &Path) -> Result<(), ModelError>;
}

impl RestoreWeights for HybridModel {
    fn load_weights(&mut self, checkpoint_dir: &Path) -> Result<(), ModelError> {
        let path = checkpoint_path(checkpoint_dir);
        let cp = load_from_disk(&path)?;
        self.restore_from(&cp)?;
        tracing::info!(
            path = %path.display(),
            label = %cp.metadata.label,
            trained_units = cp.metadata.units,
            trained_cycles = cp.metadata.cycles,
            "Hybrid weights restored"
        );
        Ok(())
    }
}

/// Checkpoint file inside a checkpoint directory.
pub fn checkpoint_path(checkpoint_dir: &Path) -> PathBuf {
    checkpoint_dir.join(CHECKPOINT_FILE)
}

/// Write bytes atomically, mapping failures to the target path.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    crate::persist::write_atomic(path, bytes).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a checkpoint to disk atomically.
pub fn save_to_disk(cp: &HybridCheckpoint, path: &Path) -> Result<(), ModelError> {
    let json = serde_json::to_vec(cp).map_err(|source| ModelError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &json)
}

/// Load a checkpoint from disk.
pub fn load_from_disk(path: &Path) -> Result<HybridCheckpoint, ModelError> {
    let data = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| ModelError::Format {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{initial_crack_column, StressBatch};
    use crate::rnn::cell::CumulativeDamageCell;
    use crate::rnn::mlp::tests::{linear_regressor, tiny_regressor};
    use crate::rnn::model::CumulativeDamageModel;
    use crate::rnn::CrackGrowthModel;
    use crate::types::{BatchShape, Precision};
    use ndarray::Array2;

    fn hybrid(regressor: DenseRegressor) -> HybridModel {
        let cell = CumulativeDamageCell::new(regressor, 1.5e-11, 3.8, Precision::F64);
        CumulativeDamageModel::new(
            cell,
            BatchShape::new(2, 30),
            initial_crack_column(2, 0.005, Precision::F64),
            true,
        )
        .expect("model")
    }

    fn batch() -> StressBatch {
        StressBatch::from_unit_major(&Array2::from_shape_fn((2, 30), |(u, c)| {
            80.0 + 10.0 * u as f64 + (c % 5) as f64
        }))
    }

    #[test]
    fn test_serde_round_trip() {
        let model = hybrid(tiny_regressor());
        let cp = model.snapshot("run-60");
        let json = serde_json::to_string(&cp).expect("serialize");
        let restored: HybridCheckpoint = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.version, CHECKPOINT_VERSION);
        assert_eq!(restored.metadata.label, "run-60");
        assert_eq!(restored.metadata.units, 2);
        assert_eq!(restored.signature, cp.signature);
    }

    #[test]
    fn test_restore_produces_same_output() {
        let trained = hybrid(tiny_regressor());
        let cp = trained.snapshot("trained");

        // Same architecture, different weights
        let mut other = tiny_regressor();
        other.layers[1].bias[0] = -3.0;
        other.layers[0].weights[0][1] = 0.9;
        let mut fresh = hybrid(other);

        let before = fresh.predict_on_batch(&batch()).expect("predict");
        fresh.restore_from(&cp).expect("restore should succeed");
        let after = fresh.predict_on_batch(&batch()).expect("predict");
        let reference = trained.predict_on_batch(&batch()).expect("predict");

        assert_ne!(before.final_cycle(), reference.final_cycle());
        for (a, b) in after.final_cycle().iter().zip(reference.final_cycle()) {
            assert!((a - b).abs() < 1e-15, "predictions diverged: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_restore_keeps_trainable_flag() {
        let cp = hybrid(tiny_regressor()).snapshot("trained");
        let mut regressor = tiny_regressor();
        regressor.set_trainable(true);
        let mut model = hybrid(regressor);
        model.restore_from(&cp).expect("restore");
        assert!(model.cell().stress_intensity().trainable);
    }

    #[test]
    fn test_reject_mismatched_architecture() {
        let cp = hybrid(linear_regressor(0.1, 0.0, 1.0)).snapshot("linear");
        let mut model = hybrid(tiny_regressor());
        let err = model.restore_from(&cp).expect_err("should reject");
        match err {
            ModelError::IncompatibleCheckpoint(msg) => assert!(msg.contains("architecture mismatch")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_reject_forged_signature() {
        let mut cp = hybrid(tiny_regressor()).snapshot("forged");
        cp.regressor = linear_regressor(0.1, 0.0, 1.0);
        let mut model = hybrid(tiny_regressor());
        assert!(matches!(
            model.restore_from(&cp),
            Err(ModelError::IncompatibleCheckpoint(_))
        ));
    }

    #[test]
    fn test_reject_unknown_version() {
        let mut cp = hybrid(tiny_regressor()).snapshot("future");
        cp.version = 99;
        let mut model = hybrid(tiny_regressor());
        assert!(matches!(
            model.restore_from(&cp),
            Err(ModelError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_restore_takes_checkpoint_paris_constants() {
        let mut source = hybrid(tiny_regressor());
        source.cell_mut().set_paris_constants(2.0e-11, 3.5);
        let cp = source.snapshot("constants");

        let mut model = hybrid(tiny_regressor());
        model.restore_from(&cp).expect("restore");
        assert_eq!(model.cell().paris_constants(), (2.0e-11, 3.5));
        assert_eq!((cp.paris_coefficient, cp.paris_exponent), (2.0e-11, 3.5));
    }

    #[test]
    fn test_disk_persistence() {
        let model = hybrid(tiny_regressor());
        let cp = model.snapshot("disk");

        let dir = tempfile::tempdir().expect("tmpdir");
        let ckpt_dir = dir.path().join("training_60_points");
        save_to_disk(&cp, &checkpoint_path(&ckpt_dir)).expect("save");

        let mut fresh = hybrid(tiny_regressor());
        fresh.load_weights(&ckpt_dir).expect("load");
        let loaded = load_from_disk(&checkpoint_path(&ckpt_dir)).expect("load");
        assert_eq!(loaded.metadata.label, "disk");
        assert!(!ckpt_dir.join("cp.json.tmp").exists());
    }

    #[test]
    fn test_missing_checkpoint_is_io_error() {
        let mut model = hybrid(tiny_regressor());
        let err = model
            .load_weights(Path::new("/nonexistent/training_60_points"))
            .expect_err("missing");
        assert!(matches!(err, ModelError::Io { .. }));
    }
}
