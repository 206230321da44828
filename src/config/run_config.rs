//! Run Configuration - file locations, physics constants and plot settings
//!
//! Each struct implements `Default` with the values the pretrained artifacts
//! were produced for, so a run without any config file reproduces the
//! reference study.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::physics::PhysicsConstants;
use crate::types::Precision;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one evaluation run.
///
/// Load with `RunConfig::load()` which searches:
/// 1. `$CRACK_RNN_CONFIG` env var
/// 2. `./crack_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Fleet data files
    #[serde(default)]
    pub data: DataConfig,

    /// Physics constants and model artifacts
    #[serde(default)]
    pub model: ModelConfig,

    /// Plot rendering
    #[serde(default)]
    pub plot: PlotConfig,
}

impl RunConfig {
    /// Load configuration using the standard search order:
    /// 1. `$CRACK_RNN_CONFIG` environment variable
    /// 2. `./crack_config.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A config source that is named or present but cannot be read, parsed
    /// or validated is an error. Defaults apply only when no source exists.
    pub fn load() -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(defaults::CONFIG_ENV_VAR).map(PathBuf::from);
        Self::resolve(env_path.as_deref(), Path::new(defaults::LOCAL_CONFIG_FILE))
    }

    fn resolve(env_path: Option<&Path>, local: &Path) -> Result<Self, ConfigError> {
        // 1. Env var: a named file must load
        if let Some(p) = env_path {
            let config = Self::load_from_file(p)?;
            info!(path = %p.display(), "Loaded run config from {}", defaults::CONFIG_ENV_VAR);
            return Ok(config);
        }

        // 2. Local file
        if local.exists() {
            let config = Self::load_from_file(local)?;
            info!(path = %local.display(), "Loaded run config");
            return Ok(config);
        }

        // 3. Defaults
        info!("No run config found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values, collecting every problem before failing.
    ///
    /// - Physics constants must be finite and strictly positive
    /// - Plot bounds must be finite with lower < upper
    /// - Font size must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.model;
        let mut errors: Vec<String> = Vec::new();

        Self::check_positive(m.initial_crack_length, "model.initial_crack_length", &mut errors);
        Self::check_positive(m.paris_exponent, "model.paris_exponent", &mut errors);
        Self::check_positive(m.paris_coefficient, "model.paris_coefficient", &mut errors);
        Self::check_positive(m.geometry_factor, "model.geometry_factor", &mut errors);

        let p = &self.plot;
        if !p.lower_bound.is_finite() || !p.upper_bound.is_finite() {
            errors.push(format!(
                "plot bounds must be finite (got lower={}, upper={})",
                p.lower_bound, p.upper_bound
            ));
        } else if p.lower_bound >= p.upper_bound {
            errors.push(format!(
                "plot.lower_bound ({:.4}) must be less than plot.upper_bound ({:.4})",
                p.lower_bound, p.upper_bound
            ));
        }
        if p.font_size == 0 {
            errors.push("plot.font_size must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, catch them explicitly
        if !value.is_finite() {
            errors.push(format!("{name} must be finite (got {value})"));
        } else if value <= 0.0 {
            errors.push(format!("{name} must be > 0 (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Data
// ============================================================================

/// Fleet input tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Ground-truth crack length CSV
    #[serde(default = "default_crack_csv")]
    pub crack_csv: PathBuf,
    /// Stress history CSV
    #[serde(default = "default_stress_csv")]
    pub stress_csv: PathBuf,
    /// Numeric precision applied to parsed values and recursion state
    #[serde(default)]
    pub precision: Precision,
}

fn default_crack_csv() -> PathBuf {
    PathBuf::from(defaults::CRACK_CSV)
}

fn default_stress_csv() -> PathBuf {
    PathBuf::from(defaults::STRESS_CSV)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            crack_csv: default_crack_csv(),
            stress_csv: default_stress_csv(),
            precision: Precision::default(),
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// Physics constants and pretrained artifact locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Initial crack length a0 (m)
    #[serde(default = "default_initial_crack_length")]
    pub initial_crack_length: f64,
    /// Paris model exponent m
    #[serde(default = "default_paris_exponent")]
    pub paris_exponent: f64,
    /// Paris model coefficient C
    #[serde(default = "default_paris_coefficient")]
    pub paris_coefficient: f64,
    /// Geometry factor F of the analytical stress-intensity range
    #[serde(default = "default_geometry_factor")]
    pub geometry_factor: f64,
    /// Serialized stress-intensity regressor
    #[serde(default = "default_mlp_path")]
    pub mlp_path: PathBuf,
    /// Hybrid checkpoint directory
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
}

fn default_initial_crack_length() -> f64 {
    defaults::INITIAL_CRACK_LENGTH_M
}

fn default_paris_exponent() -> f64 {
    defaults::PARIS_EXPONENT
}

fn default_paris_coefficient() -> f64 {
    defaults::PARIS_COEFFICIENT
}

fn default_geometry_factor() -> f64 {
    defaults::GEOMETRY_FACTOR
}

fn default_mlp_path() -> PathBuf {
    PathBuf::from(defaults::MLP_PATH)
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(defaults::CHECKPOINT_DIR)
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            initial_crack_length: default_initial_crack_length(),
            paris_exponent: default_paris_exponent(),
            paris_coefficient: default_paris_coefficient(),
            geometry_factor: default_geometry_factor(),
            mlp_path: default_mlp_path(),
            checkpoint_dir: default_checkpoint_dir(),
        }
    }
}

impl ModelConfig {
    /// Closed-form constants shared by the hybrid and analytical models.
    pub fn physics_constants(&self) -> PhysicsConstants {
        PhysicsConstants {
            paris_coefficient: self.paris_coefficient,
            paris_exponent: self.paris_exponent,
            geometry_factor: self.geometry_factor,
        }
    }
}

// ============================================================================
// Plot
// ============================================================================

/// Scatter plot rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Lower bound of both axes (m)
    #[serde(default = "default_lower_bound")]
    pub lower_bound: f64,
    /// Upper bound of both axes (m)
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,
    /// Font size for labels and legend
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    /// SVG output path
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_lower_bound() -> f64 {
    defaults::PLOT_LOWER_BOUND_M
}

fn default_upper_bound() -> f64 {
    defaults::PLOT_UPPER_BOUND_M
}

fn default_font_size() -> u32 {
    defaults::PLOT_FONT_SIZE
}

fn default_output_path() -> PathBuf {
    PathBuf::from(defaults::PLOT_OUTPUT_PATH)
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            font_size: default_font_size(),
            output_path: default_output_path(),
        }
    }
}
