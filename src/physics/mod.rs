//! Physics Module
//!
//! Deterministic fatigue calculations. All math here is pure
//! physics/statistics - no learned components.
//!
//! - `paris_increment()` - Paris law growth per cycle
//! - `stress_intensity_range()` - closed-form ΔK for a through crack
//! - `ErrorMetrics` - MSE and max absolute error against ground truth

pub mod metrics;
pub mod paris;

pub use metrics::{max_abs_error, mean_squared_error, residuals, ErrorMetrics, MetricsError};
pub use paris::{paris_increment, stress_intensity_range, PhysicsConstants};
