//! Descriptive error metrics for final-cycle crack length predictions

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Length mismatch: {actual} actual values vs {predicted} predictions")]
    LengthMismatch { actual: usize, predicted: usize },

    #[error("No fleet units to compare")]
    Empty,
}

/// Mean squared error and maximum absolute error over a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub mse: f64,
    pub max_abs_error: f64,
}

impl ErrorMetrics {
    /// Compare per-unit predictions against ground truth.
    pub fn compare(actual: &[f64], predicted: &[f64]) -> Result<Self, MetricsError> {
        let err = residuals(actual, predicted)?;
        Ok(Self {
            mse: mean_squared_error(&err),
            max_abs_error: max_abs_error(&err),
        })
    }
}

/// Per-unit residuals `actual - predicted`
pub fn residuals(actual: &[f64], predicted: &[f64]) -> Result<Vec<f64>, MetricsError> {
    if actual.len() != predicted.len() {
        return Err(MetricsError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(actual.iter().zip(predicted).map(|(a, p)| a - p).collect())
}

/// Arithmetic mean of squared residuals
///
/// Returns 0.0 for an empty slice.
pub fn mean_squared_error(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    residuals.iter().map(|e| e * e).sum::<f64>() / residuals.len() as f64
}

/// Largest absolute residual
///
/// Returns 0.0 for an empty slice and NaN if any residual is NaN.
pub fn max_abs_error(residuals: &[f64]) -> f64 {
    // f64::max drops NaN operands, so check first
    if residuals.iter().any(|e| e.is_nan()) {
        return f64::NAN;
    }
    residuals.iter().map(|e| e.abs()).fold(0.0, f64::max)
}
