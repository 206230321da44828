//! fleet-crack-rnn: Hybrid Physics-Informed Crack Growth Evaluation
//!
//! Compares a hybrid recursive model (pretrained ΔK regressor inside the
//! Paris-law recursion) against the purely analytical recursion on a fleet of
//! aircraft structures, scoring both on final-cycle crack length.
//!
//! ## Architecture
//!
//! - **Fleet Loader**: crack-length ground truth and stress histories from CSV
//! - **RNN Module**: cumulative damage cell, dense regressor, checkpoints, model factory
//! - **Physics**: Paris law, closed-form ΔK, error metrics
//! - **Evaluation**: one batch pass per model, MSE and max absolute error
//! - **Plot**: predicted-vs-actual SVG scatter
//! - **Synth**: seeded synthetic fleets for demos and tests

pub mod config;
pub mod types;
pub mod physics;
pub mod fleet;
pub mod rnn;
pub mod evaluation;
pub mod plot;
pub mod synth;
pub mod persist;

// Re-export run configuration
pub use config::RunConfig;

// Re-export commonly used types
pub use types::{BatchShape, Precision};

// Re-export data loading
pub use fleet::{FleetData, FleetDataError, StressBatch};

// Re-export models
pub use rnn::{
    CrackGrowthModel, CrackPrediction, HybridModel, ModelError, ModelFactory, NativeModelFactory,
    PhysicsModel,
};

// Re-export evaluation
pub use evaluation::{run_evaluation, EvaluationError, EvaluationReport, ModelScore};
pub use physics::ErrorMetrics;
pub use plot::{PlotError, PredictionPlot, ScatterSeries};
