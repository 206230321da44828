//! Evaluation Pipeline Integration Test
//!
//! Generates a small seeded fleet, writes the regressor and hybrid
//! checkpoint artifacts into a scratch directory, and runs the full
//! evaluation: CSV load -> model build -> checkpoint restore -> inference
//! -> metrics -> plot and report.

use fleet_crack_rnn::config::RunConfig;
use fleet_crack_rnn::evaluation::{run_evaluation, EvaluationError, EvaluationReport};
use fleet_crack_rnn::fleet::initial_crack_column;
use fleet_crack_rnn::plot::{PredictionPlot, ScatterSeries};
use fleet_crack_rnn::rnn::checkpoint::{checkpoint_path, save_to_disk};
use fleet_crack_rnn::rnn::{
    Activation, DenseLayer, DenseRegressor, InputScaling, LearnedModelConfig, ModelError,
    ModelFactory, NativeModelFactory,
};
use fleet_crack_rnn::synth::{self, SynthConfig};
use fleet_crack_rnn::types::{BatchShape, Precision};
use std::path::Path;

const UNITS: usize = 6;
const CYCLES: usize = 300;

/// ΔK ≈ F S sqrt(π a0) for a0 = 5 mm.
fn linear_dk_regressor() -> DenseRegressor {
    DenseRegressor::new(
        "DK_MLP",
        None,
        vec![DenseLayer {
            weights: vec![vec![0.1253], vec![0.0]],
            bias: vec![0.0],
            activation: Activation::Linear,
        }],
    )
    .expect("valid regressor")
}

/// 2 -> 4 (tanh) -> 1 regressor, a different architecture.
fn hidden_layer_regressor() -> DenseRegressor {
    DenseRegressor::new(
        "DK_MLP",
        Some(InputScaling::from_bounds(vec![0.0, 0.0], vec![200.0, 0.06])),
        vec![
            DenseLayer {
                weights: vec![vec![0.4, 0.1, -0.2, 0.3], vec![0.2, 0.5, 0.1, -0.1]],
                bias: vec![0.0; 4],
                activation: Activation::Tanh,
            },
            DenseLayer {
                weights: vec![vec![5.0], vec![2.0], vec![1.0], vec![3.0]],
                bias: vec![10.0],
                activation: Activation::Linear,
            },
        ],
    )
    .expect("valid regressor")
}

/// Write the fleet CSVs, `DK_MLP.json` and `training_60_points/cp.json`.
fn write_artifacts(dir: &Path, checkpoint_regressor: DenseRegressor) -> RunConfig {
    let mut config = RunConfig::default();
    config.data.crack_csv = dir.join("aFleet_5yrs.csv");
    config.data.stress_csv = dir.join("SFleet_5yrs.csv");
    config.model.mlp_path = dir.join("DK_MLP.json");
    config.model.checkpoint_dir = dir.join("training_60_points");
    config.plot.output_path = dir.join("crack_prediction.svg");

    let fleet = synth::generate(
        &SynthConfig {
            units: UNITS,
            cycles: CYCLES,
            geometry_spread: 0.0,
            seed: Some(2024),
            ..SynthConfig::default()
        },
        &config.model.physics_constants(),
        config.model.initial_crack_length,
        config.data.precision,
    )
    .expect("generate");
    synth::write_csv(&config.data.crack_csv, &fleet.labels, &fleet.crack_length).expect("crack csv");
    synth::write_csv(&config.data.stress_csv, &fleet.labels, &fleet.stress).expect("stress csv");

    linear_dk_regressor().save(&config.model.mlp_path).expect("save regressor");

    let model = NativeModelFactory
        .build_learned_model(LearnedModelConfig {
            regressor: checkpoint_regressor,
            paris_coefficient: config.model.paris_coefficient,
            paris_exponent: config.model.paris_exponent,
            batch_input_shape: BatchShape::new(UNITS, CYCLES),
            initial_crack: initial_crack_column(UNITS, config.model.initial_crack_length, Precision::F32),
            precision: Precision::F32,
            return_sequences: true,
        })
        .expect("hybrid");
    save_to_disk(&model.snapshot("integration"), &checkpoint_path(&config.model.checkpoint_dir))
        .expect("save checkpoint");

    config
}

#[test]
fn full_pipeline_scores_both_models() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let config = write_artifacts(dir.path(), linear_dk_regressor());

    let report = run_evaluation(&NativeModelFactory, &config).expect("evaluation");

    assert_eq!(report.units, UNITS);
    assert_eq!(report.cycles, CYCLES);
    assert_eq!(report.actual_final.len(), UNITS);
    assert_eq!(report.physics.predicted_final.len(), UNITS);
    assert_eq!(report.hybrid.predicted_final.len(), UNITS);

    // Ground truth was grown by the same analytical recursion
    assert_eq!(report.physics.metrics.mse, 0.0);
    assert_eq!(report.physics.metrics.max_abs_error, 0.0);

    // Frozen ΔK at a0 stays close over a short history
    assert!(report.hybrid.metrics.mse >= 0.0);
    assert!(report.hybrid.metrics.mse < 1e-10, "hybrid mse {}", report.hybrid.metrics.mse);
    assert!(report.hybrid.metrics.max_abs_error >= report.hybrid.metrics.mse.sqrt() - 1e-12);

    for (a, p) in report.actual_final.iter().zip(&report.hybrid.predicted_final) {
        assert!(*a > config.model.initial_crack_length);
        assert!(*p > config.model.initial_crack_length);
    }
}

#[test]
fn plot_and_report_are_written() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let config = write_artifacts(dir.path(), linear_dk_regressor());
    let report = run_evaluation(&NativeModelFactory, &config).expect("evaluation");

    let mut plot = PredictionPlot::new(&config.plot).expect("plot");
    plot.add_series(ScatterSeries::with_metrics(
        "Physics RNN",
        &report.actual_final,
        &report.physics.predicted_final,
        &report.physics.metrics,
    ))
    .expect("series");
    plot.add_series(ScatterSeries::with_metrics(
        "Hybrid RNN",
        &report.actual_final,
        &report.hybrid.predicted_final,
        &report.hybrid.metrics,
    ))
    .expect("series");
    plot.save(&config.plot.output_path).expect("save plot");

    let svg = std::fs::read_to_string(&config.plot.output_path).expect("read svg");
    assert!(svg.contains("Physics RNN"));
    assert!(svg.contains("MSE = 0.0e+00"));

    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).expect("write report");
    let loaded: EvaluationReport =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("read")).expect("parse");
    assert_eq!(loaded.unit_labels.len(), UNITS);
    assert_eq!(loaded.hybrid.label, "Hybrid RNN");
}

#[test]
fn incompatible_checkpoint_aborts_run() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let config = write_artifacts(dir.path(), hidden_layer_regressor());

    let err = run_evaluation(&NativeModelFactory, &config).expect_err("incompatible");
    assert!(
        matches!(err, EvaluationError::Model(ModelError::IncompatibleCheckpoint(_))),
        "unexpected error: {err}"
    );
}

#[test]
fn missing_checkpoint_aborts_run() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let mut config = write_artifacts(dir.path(), linear_dk_regressor());
    config.model.checkpoint_dir = dir.path().join("no_such_dir");

    let err = run_evaluation(&NativeModelFactory, &config).expect_err("missing");
    assert!(matches!(err, EvaluationError::Model(ModelError::Io { .. })));
}

#[test]
fn unit_count_mismatch_between_tables_is_reported() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let config = write_artifacts(dir.path(), linear_dk_regressor());
    std::fs::write(&config.data.crack_csv, "u0,u1\n0.01,0.02\n").expect("overwrite");

    let err = run_evaluation(&NativeModelFactory, &config).expect_err("mismatch");
    assert!(matches!(
        err,
        EvaluationError::Fleet(fleet_crack_rnn::fleet::FleetDataError::UnitMismatch { .. })
    ));
}
