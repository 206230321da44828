//! Closed-form fatigue crack growth relations

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fixed physics constants shared by the hybrid and analytical models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConstants {
    /// Paris coefficient C
    pub paris_coefficient: f64,
    /// Paris exponent m
    pub paris_exponent: f64,
    /// Geometry factor F (analytical model only)
    pub geometry_factor: f64,
}

/// Paris law crack growth per cycle
///
/// da/dN = C * ΔK^m
///
/// A non-positive or non-finite ΔK produces no growth: cracks never close,
/// and a fractional power of a negative number has no real value.
pub fn paris_increment(delta_k: f64, coefficient: f64, exponent: f64) -> f64 {
    if !delta_k.is_finite() || delta_k <= 0.0 {
        return 0.0;
    }
    coefficient * delta_k.powf(exponent)
}

/// Stress-intensity range for a through crack
///
/// ΔK = F * ΔS * sqrt(π a)
///
/// Returns 0.0 for a non-positive crack length.
pub fn stress_intensity_range(stress: f64, crack_length: f64, geometry_factor: f64) -> f64 {
    if crack_length <= 0.0 {
        return 0.0;
    }
    geometry_factor * stress * (PI * crack_length).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_intensity_range_known_value() {
        // 100 MPa on a crack of 1/π m gives exactly 100 MPa·sqrt(m)
        let dk = stress_intensity_range(100.0, 1.0 / PI, 1.0);
        assert!((dk - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_stress_intensity_scales_with_geometry() {
        let base = stress_intensity_range(80.0, 0.005, 1.0);
        let scaled = stress_intensity_range(80.0, 0.005, 1.12);
        assert!((scaled / base - 1.12).abs() < 1e-12);
    }

    #[test]
    fn test_stress_intensity_zero_crack() {
        assert_eq!(stress_intensity_range(100.0, 0.0, 1.0), 0.0);
        assert_eq!(stress_intensity_range(100.0, -0.01, 1.0), 0.0);
    }

    #[test]
    fn test_paris_increment_basic() {
        // C * 10^3 = 1e-11 * 1000
        let da = paris_increment(10.0, 1e-11, 3.0);
        assert!((da - 1e-8).abs() < 1e-20);
    }

    #[test]
    fn test_paris_increment_non_positive_dk() {
        assert_eq!(paris_increment(0.0, 1.5e-11, 3.8), 0.0);
        assert_eq!(paris_increment(-5.0, 1.5e-11, 3.8), 0.0);
        assert_eq!(paris_increment(f64::NAN, 1.5e-11, 3.8), 0.0);
    }

    #[test]
    fn test_paris_increment_monotonic_in_dk() {
        let low = paris_increment(8.0, 1.5e-11, 3.8);
        let high = paris_increment(12.0, 1.5e-11, 3.8);
        assert!(high > low);
    }
}
