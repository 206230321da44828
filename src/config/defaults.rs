//! Built-in default constants.
//!
//! Values match the fleet study the pretrained artifacts were produced for.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Data
// ============================================================================

/// Ground-truth crack length table (cycle rows x unit columns).
pub const CRACK_CSV: &str = "aFleet_5yrs.csv";

/// Stress history table (cycle rows x unit columns).
pub const STRESS_CSV: &str = "SFleet_5yrs.csv";

// ============================================================================
// Physics
// ============================================================================

/// Initial crack length (m).
pub const INITIAL_CRACK_LENGTH_M: f64 = 0.005;

/// Paris model exponent.
pub const PARIS_EXPONENT: f64 = 3.8;

/// Paris model coefficient.
pub const PARIS_COEFFICIENT: f64 = 1.5e-11;

/// Geometry factor of the analytical stress-intensity range.
pub const GEOMETRY_FACTOR: f64 = 1.0;

// ============================================================================
// Model Artifacts
// ============================================================================

/// Serialized stress-intensity regressor.
pub const MLP_PATH: &str = "DK_MLP.json";

/// Directory holding the hybrid model checkpoint.
pub const CHECKPOINT_DIR: &str = "./training_60_points";

/// Checkpoint file name inside `CHECKPOINT_DIR`.
pub const CHECKPOINT_FILE: &str = "cp.json";

/// Current hybrid checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

// ============================================================================
// Plot
// ============================================================================

/// Lower bound of both plot axes (m).
pub const PLOT_LOWER_BOUND_M: f64 = 0.0;

/// Upper bound of both plot axes (m).
pub const PLOT_UPPER_BOUND_M: f64 = 0.06;

/// Font size for axis labels and legend text.
pub const PLOT_FONT_SIZE: u32 = 14;

/// Rendered plot location.
pub const PLOT_OUTPUT_PATH: &str = "crack_prediction.svg";

// ============================================================================
// Environment
// ============================================================================

/// Environment variable pointing at a TOML run configuration.
pub const CONFIG_ENV_VAR: &str = "CRACK_RNN_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "crack_config.toml";
