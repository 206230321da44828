//! Cumulative damage cell: one recursive crack-growth step.
//!
//! Implements the physically structured per-cycle update, with the
//! stress-intensity term supplied either by a closed-form expression or by a
//! learned regressor:
//!
//! ```text
//! For each fleet unit and cycle t:
//!   dK[t] = K(S[t], a[t-1])
//!   da[t] = C * max(dK[t], 0)^m
//!   a[t]  = a[t-1] + da[t]
//! ```

use serde::{Deserialize, Serialize};

use crate::physics::{paris_increment, stress_intensity_range};
use crate::types::Precision;

/// Source of the stress-intensity range inside the recursion.
pub trait StressIntensity {
    /// ΔK for the current cycle's stress and the crack length entering it.
    fn delta_k(&self, stress: f64, crack_length: f64) -> f64;
}

/// Closed-form ΔK = F * S * sqrt(π a).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticalStressIntensity {
    pub geometry_factor: f64,
}

impl StressIntensity for AnalyticalStressIntensity {
    fn delta_k(&self, stress: f64, crack_length: f64) -> f64 {
        stress_intensity_range(stress, crack_length, self.geometry_factor)
    }
}

/// Paris-law recursion around a stress-intensity source.
#[derive(Debug, Clone)]
pub struct CumulativeDamageCell<K> {
    stress_intensity: K,
    paris_coefficient: f64,
    paris_exponent: f64,
    precision: Precision,
}

impl<K: StressIntensity> CumulativeDamageCell<K> {
    pub fn new(stress_intensity: K, paris_coefficient: f64, paris_exponent: f64, precision: Precision) -> Self {
        Self {
            stress_intensity,
            paris_coefficient,
            paris_exponent,
            precision,
        }
    }

    /// Advance one cycle: crack length after applying `stress` to a crack of
    /// length `a_prev`.
    #[inline]
    pub fn step(&self, stress: f64, a_prev: f64) -> f64 {
        let dk = self.stress_intensity.delta_k(stress, a_prev);
        let da = paris_increment(dk, self.paris_coefficient, self.paris_exponent);
        self.precision.quantize(a_prev + da)
    }

    pub fn stress_intensity(&self) -> &K {
        &self.stress_intensity
    }

    pub fn stress_intensity_mut(&mut self) -> &mut K {
        &mut self.stress_intensity
    }

    pub fn paris_constants(&self) -> (f64, f64) {
        (self.paris_coefficient, self.paris_exponent)
    }

    pub fn set_paris_constants(&mut self, coefficient: f64, exponent: f64) {
        self.paris_coefficient = coefficient;
        self.paris_exponent = exponent;
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }
}
