//! Shared value types used across the loader, models and report.

use serde::{Deserialize, Serialize};

/// Numeric precision applied to parsed data and to every recursion state.
///
/// The pretrained artifacts were produced in single precision, so `F32` is
/// the default: values are rounded through `f32` while arithmetic stays in
/// `f64`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl Precision {
    /// Round a value to this precision.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            Precision::F32 => f64::from(value as f32),
            Precision::F64 => value,
        }
    }

    /// Name as written in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::F32 => "float32",
            Precision::F64 => "float64",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimensions of a fleet batch: `(units, cycles, features)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchShape {
    pub units: usize,
    pub cycles: usize,
    pub features: usize,
}

impl BatchShape {
    pub fn new(units: usize, cycles: usize) -> Self {
        Self { units, cycles, features: 1 }
    }

    pub fn as_tuple(self) -> (usize, usize, usize) {
        (self.units, self.cycles, self.features)
    }
}

impl std::fmt::Display for BatchShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.units, self.cycles, self.features)
    }
}
