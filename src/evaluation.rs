//! Fleet evaluation pipeline.
//!
//! Loads the fleet, builds the hybrid and physics models through a
//! [`ModelFactory`], runs one batch forward pass per model and scores the
//! final-cycle crack length of every unit against ground truth.
//!
//! ```text
//! CSV ──► FleetData ──► StressBatch (units, cycles, 1)
//!                          │
//!            ┌─────────────┴─────────────┐
//!            ▼                           ▼
//!   Physics model (F S √πa)     Hybrid model (DK_MLP + cp.json)
//!            │                           │
//!            └──── final cycle ──────────┘
//!                          ▼
//!                 MSE / max |error|  ──► EvaluationReport
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::RunConfig;
use crate::fleet::{initial_crack_column, FleetData, FleetDataError};
use crate::physics::{residuals, ErrorMetrics, MetricsError};
use crate::rnn::{
    AnalyticalModelConfig, CrackGrowthModel, DenseRegressor, LearnedModelConfig, ModelError,
    ModelFactory, RestoreWeights,
};
use crate::types::Precision;

/// Legend and report label of the analytical model.
pub const PHYSICS_LABEL: &str = "Physics RNN";
/// Legend and report label of the hybrid model.
pub const HYBRID_LABEL: &str = "Hybrid RNN";

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Fleet data: {0}")]
    Fleet(#[from] FleetDataError),

    #[error("Model: {0}")]
    Model(#[from] ModelError),

    #[error("Metrics for {label}: {source}")]
    Metrics {
        label: String,
        #[source]
        source: MetricsError,
    },

    #[error("Failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One model's final-cycle predictions and their error against ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {
    pub label: String,
    pub predicted_final: Vec<f64>,
    /// `actual - predicted`, per unit.
    pub residuals: Vec<f64>,
    pub metrics: ErrorMetrics,
}

impl ModelScore {
    pub fn new(label: &str, actual: &[f64], predicted: Vec<f64>) -> Result<Self, EvaluationError> {
        let metrics_err = |source| EvaluationError::Metrics {
            label: label.to_string(),
            source,
        };
        let residuals = residuals(actual, &predicted).map_err(metrics_err)?;
        let metrics = ErrorMetrics::compare(actual, &predicted).map_err(metrics_err)?;
        Ok(Self {
            label: label.to_string(),
            predicted_final: predicted,
            residuals,
            metrics,
        })
    }
}

/// Outcome of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub units: usize,
    pub cycles: usize,
    pub precision: Precision,
    pub unit_labels: Vec<String>,
    /// Ground-truth crack length at the last recorded cycle.
    pub actual_final: Vec<f64>,
    pub physics: ModelScore,
    pub hybrid: ModelScore,
}

impl EvaluationReport {
    /// Write the report as pretty JSON, atomically.
    pub fn write_json(&self, path: &Path) -> Result<(), EvaluationError> {
        let json = serde_json::to_vec_pretty(self)?;
        crate::persist::write_atomic(path, &json).map_err(|source| EvaluationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Evaluation report written");
        Ok(())
    }

    /// Human-readable summary table.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Fleet: {} units x {} cycles ({})\n",
            self.units, self.cycles, self.precision
        ));
        out.push_str(&format!("{:<14} {:>12} {:>12}\n", "model", "MSE", "max |err|"));
        for score in [&self.physics, &self.hybrid] {
            out.push_str(&format!(
                "{:<14} {:>12.3e} {:>12.3e}\n",
                score.label, score.metrics.mse, score.metrics.max_abs_error
            ));
        }
        out
    }
}

/// Score two already-built models on a loaded fleet.
pub fn evaluate_models<P, H>(fleet: &FleetData, physics: &P, hybrid: &H) -> Result<EvaluationReport, EvaluationError>
where
    P: CrackGrowthModel + ?Sized,
    H: CrackGrowthModel + ?Sized,
{
    let batch = fleet.stress_batch();
    let actual = fleet.final_crack_lengths();

    let physics_pred = physics.predict_on_batch(&batch)?.final_cycle();
    let physics = ModelScore::new(PHYSICS_LABEL, &actual, physics_pred)?;
    tracing::info!(
        mse = physics.metrics.mse,
        max_abs_error = physics.metrics.max_abs_error,
        "Physics model scored"
    );

    let hybrid_pred = hybrid.predict_on_batch(&batch)?.final_cycle();
    let hybrid = ModelScore::new(HYBRID_LABEL, &actual, hybrid_pred)?;
    tracing::info!(
        mse = hybrid.metrics.mse,
        max_abs_error = hybrid.metrics.max_abs_error,
        "Hybrid model scored"
    );

    Ok(EvaluationReport {
        generated_at: Utc::now(),
        units: fleet.num_units(),
        cycles: fleet.num_cycles(),
        precision: fleet.info.precision,
        unit_labels: fleet.unit_labels().to_vec(),
        actual_final: actual,
        physics,
        hybrid,
    })
}

/// Full pipeline: load data and artifacts, build both models, score them.
pub fn run_evaluation<F: ModelFactory>(factory: &F, config: &RunConfig) -> Result<EvaluationReport, EvaluationError> {
    let precision = config.data.precision;
    let fleet = FleetData::load(&config.data.crack_csv, &config.data.stress_csv, precision)?;
    let shape = fleet.stress_batch().shape();
    let initial_crack = initial_crack_column(shape.units, config.model.initial_crack_length, precision);

    // Hybrid model: pretrained ΔK regressor inside the recursion
    let mut regressor = DenseRegressor::load(&config.model.mlp_path)?;
    regressor.set_trainable(true);
    let mut hybrid = factory.build_learned_model(LearnedModelConfig {
        regressor,
        paris_coefficient: config.model.paris_coefficient,
        paris_exponent: config.model.paris_exponent,
        batch_input_shape: shape,
        initial_crack: initial_crack.clone(),
        precision,
        return_sequences: true,
    })?;
    hybrid.load_weights(&config.model.checkpoint_dir)?;

    let physics = factory.build_analytical_model(AnalyticalModelConfig {
        geometry_factor: config.model.geometry_factor,
        paris_coefficient: config.model.paris_coefficient,
        paris_exponent: config.model.paris_exponent,
        batch_input_shape: shape,
        initial_crack,
        precision,
        return_sequences: true,
    })?;

    tracing::info!(batch = %shape, "Models ready, running inference");
    evaluate_models(&fleet, &physics, &hybrid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::FleetTable;
    use crate::rnn::{CrackPrediction, NativeModelFactory};
    use crate::types::BatchShape;
    use ndarray::Array2;

    /// Model that returns fixed final lengths regardless of input.
    struct Fixed(Vec<f64>);

    impl CrackGrowthModel for Fixed {
        fn batch_shape(&self) -> BatchShape {
            BatchShape::new(self.0.len(), 1)
        }

        fn predict_on_batch(&self, _batch: &crate::fleet::StressBatch) -> Result<CrackPrediction, ModelError> {
            let n = self.0.len();
            Ok(CrackPrediction::new(
                Array2::from_shape_vec((n, 1), self.0.clone()).expect("shape"),
            ))
        }
    }

    fn fleet() -> FleetData {
        let crack = FleetTable {
            labels: vec!["u0".into(), "u1".into(), "u2".into()],
            values: Array2::from_shape_vec((2, 3), vec![0.005, 0.005, 0.005, 0.02, 0.03, 0.04])
                .expect("shape"),
        };
        let stress = FleetTable {
            labels: vec!["u0".into(), "u1".into(), "u2".into()],
            values: Array2::from_elem((4, 3), 90.0),
        };
        FleetData::from_tables(crack, stress).expect("fleet")
    }

    #[test]
    fn test_scores_match_worked_example() {
        let report = evaluate_models(
            &fleet(),
            &Fixed(vec![0.021, 0.028, 0.042]),
            &Fixed(vec![0.02, 0.03, 0.04]),
        )
        .expect("evaluate");

        assert_eq!(report.units, 3);
        assert_eq!(report.cycles, 4);
        assert!((report.physics.metrics.mse - 3e-6).abs() < 1e-12);
        assert!((report.physics.metrics.max_abs_error - 0.002).abs() < 1e-12);
        assert_eq!(report.hybrid.metrics.mse, 0.0);
        assert_eq!(report.hybrid.metrics.max_abs_error, 0.0);
        assert_eq!(report.physics.label, PHYSICS_LABEL);
        assert!((report.physics.residuals[1] - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_unit_count_mismatch_is_metrics_error() {
        let err = evaluate_models(&fleet(), &Fixed(vec![0.02, 0.03]), &Fixed(vec![0.02, 0.03, 0.04]))
            .expect_err("mismatch");
        assert!(matches!(err, EvaluationError::Metrics { .. }));
    }

    #[test]
    fn test_summary_lists_both_models() {
        let report = evaluate_models(
            &fleet(),
            &Fixed(vec![0.021, 0.028, 0.042]),
            &Fixed(vec![0.02, 0.03, 0.04]),
        )
        .expect("evaluate");
        let summary = report.summary();
        assert!(summary.contains("Physics RNN"));
        assert!(summary.contains("Hybrid RNN"));
        assert!(summary.contains("3 units x 4 cycles"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let report = evaluate_models(
            &fleet(),
            &Fixed(vec![0.021, 0.028, 0.042]),
            &Fixed(vec![0.02, 0.03, 0.04]),
        )
        .expect("evaluate");
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");

        let loaded: EvaluationReport =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
        assert_eq!(loaded.unit_labels, vec!["u0", "u1", "u2"]);
        assert_eq!(loaded.actual_final, vec![0.02, 0.03, 0.04]);
        assert_eq!(loaded.precision, Precision::F32);
    }

    #[test]
    fn test_missing_artifacts_fail_run() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let mut config = RunConfig::default();
        config.data.crack_csv = dir.path().join("missing_a.csv");
        config.data.stress_csv = dir.path().join("missing_s.csv");
        let err = run_evaluation(&NativeModelFactory, &config).expect_err("missing");
        assert!(matches!(err, EvaluationError::Fleet(FleetDataError::Io { .. })));
    }
}
