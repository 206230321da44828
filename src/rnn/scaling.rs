//! Fixed input scaling for the stress-intensity regressor.
//!
//! The regressor was fitted on inputs mapped to roughly `[0, 1]` with a
//! per-feature location and scale:
//!
//! ```text
//! x'[i] = (x[i] - location[i]) / scale[i]
//! ```
//!
//! The statistics are frozen at export time; nothing here updates them.

use serde::{Deserialize, Serialize};

/// Floor on the scale so a constant feature never divides by zero.
const MIN_SCALE: f64 = 1e-12;

/// Per-feature affine input scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScaling {
    pub location: Vec<f64>,
    pub scale: Vec<f64>,
}

impl InputScaling {
    /// Scaling that maps `[min, min + range]` onto `[0, 1]` per feature.
    pub fn from_bounds(min: Vec<f64>, range: Vec<f64>) -> Self {
        Self { location: min, scale: range }
    }

    pub fn dim(&self) -> usize {
        self.location.len()
    }

    /// Scale a raw input vector in place.
    pub fn apply(&self, input: &mut [f64]) {
        for ((x, loc), scale) in input.iter_mut().zip(&self.location).zip(&self.scale) {
            let s = if scale.abs() < MIN_SCALE { MIN_SCALE } else { *scale };
            *x = (*x - loc) / s;
        }
    }

    /// Check the two vectors agree and hold finite values.
    pub fn validate(&self) -> Result<(), String> {
        if self.location.len() != self.scale.len() {
            return Err(format!(
                "input scaling length mismatch: location has {}, scale has {}",
                self.location.len(),
                self.scale.len()
            ));
        }
        if self.location.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("input scaling contains NaN or Inf".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_map_to_unit_interval() {
        let scaling = InputScaling::from_bounds(vec![50.0, 0.005], vec![100.0, 0.045]);
        let mut lo = [50.0, 0.005];
        let mut hi = [150.0, 0.05];
        scaling.apply(&mut lo);
        scaling.apply(&mut hi);
        assert!(lo.iter().all(|v| v.abs() < 1e-12));
        assert!(hi.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_unit_bounds_are_noop() {
        let scaling = InputScaling::from_bounds(vec![0.0, 0.0], vec![1.0, 1.0]);
        let mut x = [3.5, -1.25];
        scaling.apply(&mut x);
        assert_eq!(x, [3.5, -1.25]);
    }

    #[test]
    fn test_zero_scale_stays_finite() {
        let scaling = InputScaling::from_bounds(vec![1.0], vec![0.0]);
        let mut x = [1.0];
        scaling.apply(&mut x);
        assert!(x[0].is_finite());
    }

    #[test]
    fn test_validate_length_mismatch() {
        let scaling = InputScaling::from_bounds(vec![0.0, 0.0], vec![1.0]);
        assert!(scaling.validate().is_err());
    }
}
