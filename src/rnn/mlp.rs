//! Dense regressor approximating the stress-intensity range.
//!
//! A small multilayer perceptron with dense layers in input-major kernel
//! layout (`weights[input][output]`), exported from the training
//! environment as JSON:
//!
//! ```text
//! {
//!   "name": "DK_MLP",
//!   "input_scaling": { "location": [..], "scale": [..] },
//!   "layers": [
//!     { "weights": [[..], [..]], "bias": [..], "activation": "tanh" },
//!     ...
//!     { "weights": [[..]], "bias": [..], "activation": "linear" }
//!   ]
//! }
//! ```
//!
//! Inputs are `[stress, crack_length]`, output is `[ΔK]`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::rnn::cell::StressIntensity;
use crate::rnn::scaling::InputScaling;
use crate::rnn::ModelError;

/// Number of regressor inputs: stress and current crack length.
pub const STRESS_INTENSITY_INPUTS: usize = 2;

/// Elementwise activation of a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    Elu,
    Softplus,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Activation::Softplus => softplus(x),
        }
    }
}

/// One fully connected layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Kernel, `[inputs][outputs]`.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    pub fn inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn outputs(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        for o in &mut out {
            *o = self.activation.apply(*o);
        }
        out
    }

    fn signature(&self) -> LayerSignature {
        LayerSignature {
            inputs: self.inputs(),
            outputs: self.outputs(),
            activation: self.activation,
        }
    }
}

/// Shape of one layer, used to check checkpoint compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSignature {
    pub inputs: usize,
    pub outputs: usize,
    pub activation: Activation,
}

/// Architecture of a regressor without its weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressorSignature {
    pub input_scaling: bool,
    pub layers: Vec<LayerSignature>,
}

impl std::fmt::Display for RegressorSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.input_scaling {
            write!(f, "scale -> ")?;
        }
        for (i, l) in self.layers.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}x{}:{:?}", l.inputs, l.outputs, l.activation)?;
        }
        Ok(())
    }
}

/// Multilayer perceptron regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseRegressor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub input_scaling: Option<InputScaling>,
    pub layers: Vec<DenseLayer>,
    /// Mirrors the training configuration; inference ignores it.
    #[serde(default)]
    pub trainable: bool,
}

impl DenseRegressor {
    /// Build and validate a regressor.
    pub fn new(
        name: impl Into<String>,
        input_scaling: Option<InputScaling>,
        layers: Vec<DenseLayer>,
    ) -> Result<Self, ModelError> {
        let regressor = Self {
            name: name.into(),
            input_scaling,
            layers,
            trainable: false,
        };
        regressor.validate()?;
        Ok(regressor)
    }

    /// Load a serialized regressor from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let regressor: Self = serde_json::from_slice(&data).map_err(|source| ModelError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        regressor.validate()?;

        tracing::info!(
            path = %path.display(),
            name = %regressor.name,
            params = regressor.num_params(),
            architecture = %regressor.signature(),
            "Stress-intensity regressor loaded"
        );
        Ok(regressor)
    }

    /// Write the regressor as JSON.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| ModelError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        crate::rnn::checkpoint::write_atomic(path, &json)
    }

    pub fn set_trainable(&mut self, trainable: bool) {
        self.trainable = trainable;
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::outputs)
    }

    /// Total number of weights and biases.
    pub fn num_params(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.inputs() * l.outputs() + l.outputs())
            .sum()
    }

    pub fn signature(&self) -> RegressorSignature {
        RegressorSignature {
            input_scaling: self.input_scaling.is_some(),
            layers: self.layers.iter().map(DenseLayer::signature).collect(),
        }
    }

    /// Structural checks: chained layer sizes, rectangular kernels,
    /// finite values and matching input scaling.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InvalidRegressor("regressor has no layers".to_string()));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.outputs() == 0 || layer.inputs() == 0 {
                return Err(ModelError::InvalidRegressor(format!("layer {i} is empty")));
            }
            if let Some(row) = layer.weights.iter().position(|r| r.len() != layer.outputs()) {
                return Err(ModelError::InvalidRegressor(format!(
                    "layer {i} kernel row {row} has {} columns, bias has {}",
                    layer.weights[row].len(),
                    layer.outputs()
                )));
            }
            if layer.weights.iter().flatten().chain(&layer.bias).any(|v| !v.is_finite()) {
                return Err(ModelError::InvalidRegressor(format!(
                    "layer {i} contains NaN or Inf"
                )));
            }
            if i > 0 {
                let prev = self.layers[i - 1].outputs();
                if prev != layer.inputs() {
                    return Err(ModelError::InvalidRegressor(format!(
                        "layer {i} expects {} inputs but layer {} produces {prev}",
                        layer.inputs(),
                        i - 1
                    )));
                }
            }
        }

        if let Some(scaling) = &self.input_scaling {
            scaling.validate().map_err(ModelError::InvalidRegressor)?;
            if scaling.dim() != self.input_dim() {
                return Err(ModelError::InvalidRegressor(format!(
                    "input scaling has {} features, first layer expects {}",
                    scaling.dim(),
                    self.input_dim()
                )));
            }
        }
        Ok(())
    }

    /// Forward pass for one input vector.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut x = input.to_vec();
        if let Some(scaling) = &self.input_scaling {
            scaling.apply(&mut x);
        }
        for layer in &self.layers {
            x = layer.forward(&x);
        }
        x
    }

    /// Copy weights from `other`, keeping this regressor's name and
    /// trainable flag. Callers check signatures first.
    pub(crate) fn assign_weights(&mut self, other: &DenseRegressor) {
        self.input_scaling.clone_from(&other.input_scaling);
        self.layers.clone_from(&other.layers);
    }
}

impl StressIntensity for DenseRegressor {
    fn delta_k(&self, stress: f64, crack_length: f64) -> f64 {
        self.forward(&[stress, crack_length])
            .first()
            .copied()
            .unwrap_or(0.0)
    }
}

// ============================================================================
// Activation functions
// ============================================================================

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[inline]
pub fn softplus(x: f64) -> f64 {
    if x > 20.0 {
        x // Avoid overflow
    } else {
        (1.0 + x.exp()).ln()
    }
}
