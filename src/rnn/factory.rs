//! Model construction.
//!
//! [`ModelFactory`] is the seam between the evaluation pipeline and the code
//! that actually builds recursive models. [`NativeModelFactory`] assembles
//! the in-repo [`CumulativeDamageModel`]s.

use ndarray::Array2;

use crate::rnn::cell::{AnalyticalStressIntensity, CumulativeDamageCell};
use crate::rnn::checkpoint::RestoreWeights;
use crate::rnn::mlp::{DenseRegressor, STRESS_INTENSITY_INPUTS};
use crate::rnn::model::{CumulativeDamageModel, HybridModel, PhysicsModel};
use crate::rnn::{CrackGrowthModel, ModelError};
use crate::types::{BatchShape, Precision};

/// Inputs for the hybrid model.
#[derive(Debug, Clone)]
pub struct LearnedModelConfig {
    /// Pretrained ΔK regressor.
    pub regressor: DenseRegressor,
    pub paris_coefficient: f64,
    pub paris_exponent: f64,
    pub batch_input_shape: BatchShape,
    /// `(units, 1)` initial crack lengths.
    pub initial_crack: Array2<f64>,
    pub precision: Precision,
    pub return_sequences: bool,
}

/// Inputs for the physics-only model.
#[derive(Debug, Clone)]
pub struct AnalyticalModelConfig {
    pub geometry_factor: f64,
    pub paris_coefficient: f64,
    pub paris_exponent: f64,
    pub batch_input_shape: BatchShape,
    /// `(units, 1)` initial crack lengths.
    pub initial_crack: Array2<f64>,
    pub precision: Precision,
    pub return_sequences: bool,
}

/// Builds the two recursive models compared by the evaluation.
pub trait ModelFactory {
    type Learned: CrackGrowthModel + RestoreWeights;
    type Analytical: CrackGrowthModel;

    fn build_learned_model(&self, config: LearnedModelConfig) -> Result<Self::Learned, ModelError>;

    fn build_analytical_model(
        &self,
        config: AnalyticalModelConfig,
    ) -> Result<Self::Analytical, ModelError>;
}

/// Builds native Paris-law recursions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeModelFactory;

impl ModelFactory for NativeModelFactory {
    type Learned = HybridModel;
    type Analytical = PhysicsModel;

    fn build_learned_model(&self, config: LearnedModelConfig) -> Result<HybridModel, ModelError> {
        let regressor = config.regressor;
        if regressor.input_dim() != STRESS_INTENSITY_INPUTS || regressor.output_dim() != 1 {
            return Err(ModelError::InvalidRegressor(format!(
                "ΔK regressor must map {} inputs to 1 output, '{}' maps {} to {}",
                STRESS_INTENSITY_INPUTS,
                regressor.name,
                regressor.input_dim(),
                regressor.output_dim()
            )));
        }

        let cell = CumulativeDamageCell::new(
            regressor,
            config.paris_coefficient,
            config.paris_exponent,
            config.precision,
        );
        let model = CumulativeDamageModel::new(
            cell,
            config.batch_input_shape,
            config.initial_crack,
            config.return_sequences,
        )?;

        tracing::debug!(
            batch = %config.batch_input_shape,
            c = config.paris_coefficient,
            m = config.paris_exponent,
            "Hybrid model built"
        );
        Ok(model)
    }

    fn build_analytical_model(&self, config: AnalyticalModelConfig) -> Result<PhysicsModel, ModelError> {
        let cell = CumulativeDamageCell::new(
            AnalyticalStressIntensity {
                geometry_factor: config.geometry_factor,
            },
            config.paris_coefficient,
            config.paris_exponent,
            config.precision,
        );
        let model = CumulativeDamageModel::new(
            cell,
            config.batch_input_shape,
            config.initial_crack,
            config.return_sequences,
        )?;

        tracing::debug!(
            batch = %config.batch_input_shape,
            f = config.geometry_factor,
            c = config.paris_coefficient,
            m = config.paris_exponent,
            "Physics model built"
        );
        Ok(model)
    }
}
